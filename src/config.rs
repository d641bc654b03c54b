//! Persisted connection settings.
//!
//! The file is plain `KEY=value` lines with the keys `ELASTICSEARCH_URL`, `USERNAME` and
//! `PASSWORD`. Unknown keys, blank lines and lines without `=` are ignored; values may contain
//! `=`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret as _, SecretString};

use crate::error::LoaderResult;
use crate::store::{Credentials, Session};

pub const URL_KEY: &str = "ELASTICSEARCH_URL";
pub const USERNAME_KEY: &str = "USERNAME";
pub const PASSWORD_KEY: &str = "PASSWORD";

/// Endpoint and credentials as stored on disk.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub url: String,
    pub username: String,
    pub password: SecretString,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: SecretString::from(String::new()),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl ConnectionConfig {
    /// Parse the `KEY=value` text format.
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();
        for line in text.lines() {
            let line = line.trim();
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                URL_KEY => config.url = value.to_string(),
                USERNAME_KEY => config.username = value.to_string(),
                PASSWORD_KEY => config.password = SecretString::from(value.to_string()),
                _ => {}
            }
        }
        config
    }

    /// Load the file at `path`; `Ok(None)` if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> LoaderResult<Option<Self>> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(Self::parse(&text))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Render the `KEY=value` text format.
    pub fn render(&self) -> String {
        format!(
            "{URL_KEY}={}\n{USERNAME_KEY}={}\n{PASSWORD_KEY}={}\n",
            self.url,
            self.username,
            self.password.expose_secret()
        )
    }

    pub fn save(&self, path: impl AsRef<Path>) -> LoaderResult<()> {
        fs::write(path, self.render())?;
        Ok(())
    }

    pub fn from_session(session: &Session) -> Self {
        let credentials = session.credentials();
        Self {
            url: session.endpoint().to_string(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        }
    }

    pub fn to_session(&self) -> Session {
        Session::new(
            self.url.clone(),
            Credentials::new(self.username.clone(), self.password.clone()),
        )
    }
}

/// Where a working connection is persisted once the health probe succeeds.
pub trait ConfigStore {
    fn save(&self, config: &ConnectionConfig) -> LoaderResult<()>;
}

/// Persists the connection to a `KEY=value` file.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn save(&self, config: &ConnectionConfig) -> LoaderResult<()> {
        config.save(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret as _;

    use super::ConnectionConfig;

    #[test]
    fn parse_trims_and_ignores_noise() {
        let text = "\n# comment\n ELASTICSEARCH_URL = https://es:9200 \nUSERNAME=elastic\nPASSWORD=a=b=c\nOTHER=1\n";
        let cfg = ConnectionConfig::parse(text);
        assert_eq!(cfg.url, "https://es:9200");
        assert_eq!(cfg.username, "elastic");
        assert_eq!(cfg.password.expose_secret(), "a=b=c");
    }

    #[test]
    fn save_then_load_keeps_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elk-config.txt");
        let cfg = ConnectionConfig {
            url: "http://localhost:9200".to_string(),
            username: "u".to_string(),
            password: "p".to_string().into(),
        };
        cfg.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "ELASTICSEARCH_URL=http://localhost:9200\nUSERNAME=u\nPASSWORD=p\n");

        let loaded = ConnectionConfig::load(&path).unwrap().unwrap();
        assert_eq!(loaded.url, cfg.url);
        assert_eq!(loaded.password.expose_secret(), "p");
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConnectionConfig::load(dir.path().join("nope.txt")).unwrap().is_none());
    }
}
