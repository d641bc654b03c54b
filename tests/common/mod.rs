#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use csv_bulk_loader::config::{ConfigStore, ConnectionConfig};
use csv_bulk_loader::error::{LoaderError, LoaderResult, TransportError};
use csv_bulk_loader::interaction::{ColumnChoice, ColumnSample, Prompter, TimestampPreview};
use csv_bulk_loader::store::{
    ConnectedSession, Credentials, Method, Session, StoreRequest, StoreResponse, StoreTransport,
};

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub endpoint: String,
    pub username: String,
    pub path: String,
    pub body: String,
    pub content_type: Option<&'static str>,
    pub timeout: Option<Duration>,
}

/// In-memory transport answering from a queue of scripted replies.
///
/// When the queue is empty, every request gets `fallback`.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<StoreResponse, TransportError>>>,
    fallback: Result<StoreResponse, TransportError>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::with_fallback(Ok(ok_bulk()))
    }

    pub fn with_fallback(fallback: Result<StoreResponse, TransportError>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, status: u16, body: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(StoreResponse::new(status, body)));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(TransportError::new(message)));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, suffix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(suffix))
            .collect()
    }
}

impl StoreTransport for ScriptedTransport {
    fn send(&self, session: &Session, request: &StoreRequest) -> Result<StoreResponse, TransportError> {
        self.requests.lock().unwrap().push(Recorded {
            method: request.method,
            endpoint: session.endpoint().to_string(),
            username: session.credentials().username.clone(),
            path: request.path.clone(),
            body: request.body_text(),
            content_type: request.body.as_ref().map(|b| b.content_type),
            timeout: request.timeout,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub fn ok_bulk() -> StoreResponse {
    StoreResponse::new(200, r#"{"took":3,"errors":false,"items":[]}"#)
}

pub fn session() -> ConnectedSession {
    ConnectedSession::assume_connected(Session::new(
        "http://localhost:9200",
        Credentials::new("elastic", "changeme"),
    ))
}

/// Prompter answering from scripted queues; an exhausted queue is an interaction error.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub endpoints: VecDeque<String>,
    pub credentials: VecDeque<(String, String)>,
    pub columns: VecDeque<ColumnChoice>,
    pub confirmations: VecDeque<bool>,
    pub asked_endpoint: Vec<(String, String)>,
    pub asked_credentials: Vec<String>,
    pub offered: Vec<(Vec<String>, Option<String>)>,
    pub previews: Vec<(String, Vec<TimestampPreview>)>,
}

fn exhausted(what: &str) -> LoaderError {
    LoaderError::Interaction {
        message: format!("no scripted {what}"),
    }
}

impl Prompter for ScriptedPrompter {
    fn endpoint(&mut self, current: &str, reason: &str) -> LoaderResult<String> {
        self.asked_endpoint
            .push((current.to_string(), reason.to_string()));
        self.endpoints.pop_front().ok_or_else(|| exhausted("endpoint"))
    }

    fn credentials(&mut self, endpoint: &str) -> LoaderResult<Credentials> {
        self.asked_credentials.push(endpoint.to_string());
        let (user, pass) = self
            .credentials
            .pop_front()
            .ok_or_else(|| exhausted("credentials"))?;
        Ok(Credentials::new(user, pass))
    }

    fn timestamp_column(
        &mut self,
        columns: &[ColumnSample],
        suggested: Option<&str>,
    ) -> LoaderResult<ColumnChoice> {
        self.offered.push((
            columns.iter().map(|c| c.name.clone()).collect(),
            suggested.map(str::to_string),
        ));
        self.columns.pop_front().ok_or_else(|| exhausted("column"))
    }

    fn confirm_timestamp(
        &mut self,
        column: &str,
        previews: &[TimestampPreview],
    ) -> LoaderResult<bool> {
        self.previews.push((column.to_string(), previews.to_vec()));
        self.confirmations
            .pop_front()
            .ok_or_else(|| exhausted("confirmation"))
    }
}

/// Config store keeping saved configs in memory.
#[derive(Default)]
pub struct MemoryConfigStore {
    pub saved: Mutex<Vec<ConnectionConfig>>,
}

impl ConfigStore for MemoryConfigStore {
    fn save(&self, config: &ConnectionConfig) -> LoaderResult<()> {
        self.saved.lock().unwrap().push(config.clone());
        Ok(())
    }
}

/// Bulk body lines as parsed JSON values.
pub fn body_lines(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}
