mod common;

use secrecy::ExposeSecret as _;

use csv_bulk_loader::config::{ConnectionConfig, FileConfigStore};
use csv_bulk_loader::error::LoaderError;
use csv_bulk_loader::interaction::NonInteractive;
use csv_bulk_loader::store::{ensure_connected, Credentials, Session, HEALTH_PATH};

use common::{MemoryConfigStore, ScriptedPrompter, ScriptedTransport};

fn start() -> Session {
    Session::new("http://es.local:9200/", Credentials::new("elastic", "wrong"))
}

#[test]
fn healthy_store_connects_on_first_probe_and_persists() {
    let transport = ScriptedTransport::new().reply(200, r#"{"status":"green"}"#);
    let store = MemoryConfigStore::default();
    let mut prompter = ScriptedPrompter::default();

    let session = ensure_connected(&transport, start(), &mut prompter, &store).unwrap();

    assert_eq!(session.endpoint(), "http://es.local:9200");
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, HEALTH_PATH);
    assert!(prompter.asked_credentials.is_empty());
    assert!(prompter.asked_endpoint.is_empty());

    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].url, "http://es.local:9200");
    assert_eq!(saved[0].username, "elastic");
}

#[test]
fn unauthorized_asks_for_new_credentials_and_reprobes() {
    let transport = ScriptedTransport::new()
        .reply(401, "unauthorized")
        .reply(401, "unauthorized")
        .reply(200, "{}");
    let store = MemoryConfigStore::default();
    let mut prompter = ScriptedPrompter::default();
    prompter
        .credentials
        .push_back(("elastic".into(), "still-wrong".into()));
    prompter
        .credentials
        .push_back(("admin".into(), "s3cret".into()));

    let session = ensure_connected(&transport, start(), &mut prompter, &store).unwrap();

    assert_eq!(session.session().credentials().username, "admin");
    assert_eq!(prompter.asked_credentials.len(), 2);
    assert!(prompter.asked_endpoint.is_empty());

    let users: Vec<String> = transport.requests().into_iter().map(|r| r.username).collect();
    assert_eq!(users, vec!["elastic", "elastic", "admin"]);
    let saved = store.saved.lock().unwrap();
    assert_eq!(saved[0].password.expose_secret(), "s3cret");
}

#[test]
fn unreachable_or_unhealthy_endpoint_asks_for_a_new_address() {
    let transport = ScriptedTransport::new()
        .fail("connection refused")
        .reply(503, "starting")
        .reply(200, "{}");
    let store = MemoryConfigStore::default();
    let mut prompter = ScriptedPrompter::default();
    prompter.endpoints.push_back("http://other:9200".into());
    prompter.endpoints.push_back("https://final:9200".into());

    let session = ensure_connected(&transport, start(), &mut prompter, &store).unwrap();

    assert_eq!(session.endpoint(), "https://final:9200");
    assert_eq!(prompter.asked_endpoint.len(), 2);
    assert_eq!(prompter.asked_endpoint[0].0, "http://es.local:9200");
    assert!(prompter.asked_endpoint[0].1.contains("connection refused"));
    assert!(prompter.asked_endpoint[1].1.contains("503"));

    let endpoints: Vec<String> = transport.requests().into_iter().map(|r| r.endpoint).collect();
    assert_eq!(
        endpoints,
        vec!["http://es.local:9200", "http://other:9200", "https://final:9200"]
    );
}

#[test]
fn prompter_failure_ends_the_loop() {
    let transport = ScriptedTransport::new().reply(401, "unauthorized");
    let store = MemoryConfigStore::default();

    let err = ensure_connected(&transport, start(), &mut NonInteractive, &store).unwrap_err();
    assert!(matches!(err, LoaderError::Interaction { .. }));
    assert!(store.saved.lock().unwrap().is_empty());
}

#[test]
fn working_connection_is_written_to_the_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("elk-config.txt");
    let transport = ScriptedTransport::new().reply(401, "").reply(200, "{}");
    let mut prompter = ScriptedPrompter::default();
    prompter
        .credentials
        .push_back(("ingest".into(), "pa=ss".into()));

    ensure_connected(
        &transport,
        start(),
        &mut prompter,
        &FileConfigStore::new(&path),
    )
    .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("ELASTICSEARCH_URL=http://es.local:9200\n"));
    assert!(text.contains("USERNAME=ingest\n"));
    let loaded = ConnectionConfig::load(&path).unwrap().unwrap();
    assert_eq!(loaded.password.expose_secret(), "pa=ss");
}
