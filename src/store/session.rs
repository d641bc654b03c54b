use std::fmt;

use secrecy::SecretString;

/// Basic-auth credentials for the store.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// No username; requests are sent without an `Authorization` header.
    pub fn anonymous() -> Self {
        Self::new(String::new(), String::new())
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Endpoint and credentials every store request is issued with.
///
/// Passed explicitly to each component; only the connection guard rewrites it while recovering.
#[derive(Debug, Clone)]
pub struct Session {
    endpoint: String,
    credentials: Credentials,
}

impl Session {
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Self {
        let mut session = Self {
            endpoint: String::new(),
            credentials,
        };
        session.set_endpoint(endpoint);
        session
    }

    /// Base URL without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    /// Absolute URL for a store path such as `_cluster/health`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }
}

/// A [`Session`] that passed the health probe.
///
/// Index and upload operations only accept this type.
#[derive(Debug, Clone)]
pub struct ConnectedSession(Session);

impl ConnectedSession {
    pub(crate) fn new(session: Session) -> Self {
        Self(session)
    }

    /// Skip the health probe and treat `session` as connected.
    ///
    /// For callers that verified reachability some other way (and for tests).
    pub fn assume_connected(session: Session) -> Self {
        Self(session)
    }

    pub fn session(&self) -> &Session {
        &self.0
    }

    pub fn endpoint(&self) -> &str {
        self.0.endpoint()
    }
}
