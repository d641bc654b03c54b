//! Request/response seam between the loader and the store's REST API.

use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret as _;

use crate::error::{LoaderResult, TransportError};

use super::session::Session;

/// HTTP verb of a [`StoreRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

/// Request payload with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// A store request relative to the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRequest {
    pub method: Method,
    /// Path (and query) relative to the endpoint, e.g. `my_index/_bulk`.
    pub path: String,
    pub body: Option<RequestBody>,
    /// Per-request timeout; `None` uses the transport's default.
    pub timeout: Option<Duration>,
}

impl StoreRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn put_json(path: impl Into<String>, body: &serde_json::Value) -> LoaderResult<Self> {
        let mut req = Self::new(Method::Put, path);
        req.body = Some(RequestBody {
            content_type: "application/json",
            bytes: serde_json::to_vec(body)?,
        });
        Ok(req)
    }

    pub fn post_ndjson(path: impl Into<String>, body: String) -> Self {
        let mut req = Self::new(Method::Post, path);
        req.body = Some(RequestBody {
            content_type: "application/x-ndjson",
            bytes: body.into_bytes(),
        });
        req
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Body as UTF-8 text (lossy); empty when there is no body.
    pub fn body_text(&self) -> String {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(&b.bytes).into_owned())
            .unwrap_or_default()
    }
}

/// Status and body of a store response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    pub status: u16,
    pub body: String,
}

impl StoreResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the store.
///
/// An `Err` means no HTTP response was obtained (unreachable host, timeout, TLS failure); any
/// response, whatever its status, is `Ok`.
pub trait StoreTransport {
    fn send(&self, session: &Session, request: &StoreRequest) -> Result<StoreResponse, TransportError>;
}

impl<T: StoreTransport + ?Sized> StoreTransport for &T {
    fn send(&self, session: &Session, request: &StoreRequest) -> Result<StoreResponse, TransportError> {
        (**self).send(session, request)
    }
}

/// Options for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportOptions {
    /// Accept self-signed or otherwise invalid TLS certificates.
    pub accept_invalid_certs: bool,
    pub connect_timeout: Duration,
    /// Timeout for requests that do not set their own.
    pub default_timeout: Duration,
}

impl Default for HttpTransportOptions {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            connect_timeout: Duration::from_secs(5),
            default_timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking HTTP transport with basic auth.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    pub fn new(options: &HttpTransportOptions) -> LoaderResult<Self> {
        let client = HttpClient::builder()
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .connect_timeout(options.connect_timeout)
            .timeout(options.default_timeout)
            .build()
            .map_err(TransportError::from)?;
        Ok(Self { client })
    }
}

impl StoreTransport for HttpTransport {
    fn send(&self, session: &Session, request: &StoreRequest) -> Result<StoreResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, session.url(&request.path));
        let credentials = session.credentials();
        if !credentials.is_anonymous() {
            builder = builder.basic_auth(
                &credentials.username,
                Some(credentials.password.expose_secret()),
            );
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, body.content_type)
                .body(body.bytes.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(StoreResponse { status, body })
    }
}
