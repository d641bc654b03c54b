//! Connection precondition: nothing talks to the store before the health probe passes.

use std::time::Duration;

use crate::config::{ConfigStore, ConnectionConfig};
use crate::error::LoaderResult;
use crate::interaction::Prompter;

use super::session::{ConnectedSession, Session};
use super::transport::{StoreRequest, StoreTransport};

pub const HEALTH_PATH: &str = "_cluster/health";

/// Timeout of a single health probe.
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probe the store until it answers `200`, repairing the session through `prompter`.
///
/// - `401`: new credentials are requested and the probe is repeated.
/// - any other status, or no response at all: a new endpoint is requested.
///
/// There is no attempt limit; the loop only ends on success or when the prompter itself fails.
/// On success the working connection is saved through `config_store` (a failed save is logged
/// and otherwise ignored).
pub fn ensure_connected<T: StoreTransport + ?Sized>(
    transport: &T,
    mut session: Session,
    prompter: &mut dyn Prompter,
    config_store: &dyn ConfigStore,
) -> LoaderResult<ConnectedSession> {
    let probe = StoreRequest::get(HEALTH_PATH).with_timeout(Some(HEALTH_PROBE_TIMEOUT));
    loop {
        match transport.send(&session, &probe) {
            Ok(resp) if resp.status == 200 => {
                tracing::info!(endpoint = %session.endpoint(), "connected to store");
                if let Err(err) = config_store.save(&ConnectionConfig::from_session(&session)) {
                    tracing::warn!(error = %err, "failed to persist connection config");
                }
                return Ok(ConnectedSession::new(session));
            }
            Ok(resp) if resp.status == 401 => {
                tracing::warn!(endpoint = %session.endpoint(), "authentication failed");
                let credentials = prompter.credentials(session.endpoint())?;
                session.set_credentials(credentials);
            }
            Ok(resp) => {
                tracing::warn!(
                    endpoint = %session.endpoint(),
                    status = resp.status,
                    body = %resp.body,
                    "unexpected health response"
                );
                let reason = format!("status {}", resp.status);
                let endpoint = prompter.endpoint(session.endpoint(), &reason)?;
                session.set_endpoint(endpoint);
            }
            Err(err) => {
                tracing::warn!(endpoint = %session.endpoint(), error = %err, "store unreachable");
                let endpoint = prompter.endpoint(session.endpoint(), &err.to_string())?;
                session.set_endpoint(endpoint);
            }
        }
    }
}
