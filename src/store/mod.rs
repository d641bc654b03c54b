//! Everything that talks to the store.
//!
//! - [`session`]: endpoint + credentials, and the [`ConnectedSession`] proof type
//! - [`transport`]: the [`StoreTransport`] seam and its blocking HTTP implementation
//! - [`guard`]: [`ensure_connected`], the health-probe gate in front of every operation
//! - [`indices`]: [`IndexManager`] for create/list/delete

pub mod guard;
pub mod indices;
pub mod session;
pub mod transport;

pub use guard::{ensure_connected, HEALTH_PATH};
pub use indices::{
    dated_index_name, default_mapping, extract_date_token, sanitize_index_name, IndexManager,
    IndexSummary,
};
pub use session::{ConnectedSession, Credentials, Session};
pub use transport::{
    HttpTransport, HttpTransportOptions, Method, RequestBody, StoreRequest, StoreResponse,
    StoreTransport,
};
