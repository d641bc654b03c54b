use std::io::BufRead;

use serde_json::json;

use csv_bulk_loader::ingestion::{csv_rows_from_reader, open_csv, BulkDocumentStreamer};
use csv_bulk_loader::types::TIMESTAMP_FIELD;

fn stream_to_lines(csv: &str, index: &str, ts: Option<&str>) -> Vec<serde_json::Value> {
    let rows = csv_rows_from_reader(csv.as_bytes()).unwrap();
    let mut out = Vec::new();
    BulkDocumentStreamer::new(index, ts)
        .unwrap()
        .stream(rows, &mut out)
        .unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn duplicate_columns_and_seconds_epoch_scenario() {
    let lines = stream_to_lines("id,id,ts\n1,2,1700000000\n", "events", Some("ts"));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], json!({"index": {"_index": "events"}}));
    assert_eq!(
        lines[1],
        json!({
            "id": 1,
            "id_1": 2,
            "ts": 1700000000,
            "timestamp_field": "2023-11-14T22:13:20Z"
        })
    );
}

#[test]
fn millisecond_epoch_lands_on_the_same_instant() {
    let lines = stream_to_lines("ts\n1700000000000\n", "events", Some("ts"));
    assert_eq!(lines[1][TIMESTAMP_FIELD], "2023-11-14T22:13:20Z");
    assert_eq!(lines[1]["ts"], 1700000000000_i64);
}

#[test]
fn epoch_beyond_year_9999_keeps_the_row_without_the_field() {
    let lines = stream_to_lines("ts,n\n999999999999,1\n1700000000,2\n", "events", Some("ts"));
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], json!({"ts": 999999999999_i64, "n": 1}));
    assert_eq!(lines[3][TIMESTAMP_FIELD], "2023-11-14T22:13:20Z");
}

#[test]
fn output_alternates_action_and_document_for_every_row() {
    let rows = open_csv("tests/fixtures/events.csv").unwrap();
    let streamer = BulkDocumentStreamer::new("events", Some("event_time")).unwrap();
    let mut out = Vec::new();
    let stats = streamer.stream(rows, &mut out).unwrap();

    assert_eq!(stats.rows, 5);
    assert_eq!(stats.timestamps_normalized, 3);
    assert_eq!(stats.timestamps_failed, 1);

    let lines: Vec<String> = out.as_slice().lines().collect::<Result<_, _>>().unwrap();
    assert_eq!(lines.len(), 2 * stats.rows);
    for pair in lines.chunks(2) {
        let action: serde_json::Value = serde_json::from_str(&pair[0]).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&pair[1]).unwrap();
        assert_eq!(action, json!({"index": {"_index": "events"}}));
        assert!(doc.is_object());
        assert!(doc.get("id_1").is_some());
    }
}

#[test]
fn unparseable_and_missing_timestamps_keep_the_row() {
    let rows = open_csv("tests/fixtures/events.csv").unwrap();
    let mut out = Vec::new();
    BulkDocumentStreamer::new("events", Some("event_time"))
        .unwrap()
        .stream(rows, &mut out)
        .unwrap();
    let docs: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .skip(1)
        .step_by(2)
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(docs[2][TIMESTAMP_FIELD], "2023-11-14T22:13:20Z");
    assert_eq!(docs[3]["event_time"], "not a date");
    assert!(docs[3].get(TIMESTAMP_FIELD).is_none());
    assert!(docs[4]["event_time"].is_null());
    assert!(docs[4].get(TIMESTAMP_FIELD).is_none());
}

#[test]
fn non_finite_numbers_are_written_as_null() {
    let lines = stream_to_lines("a,b\ninf,-inf\n", "x", None);
    assert_eq!(lines[1], json!({"a": null, "b": null}));
}

#[test]
fn artifact_is_written_to_the_requested_directory_and_removed_on_delete() {
    let dir = tempfile::tempdir().unwrap();
    let rows = csv_rows_from_reader("id\n1\n2\n3\n".as_bytes()).unwrap();
    let artifact = BulkDocumentStreamer::new("nums", None)
        .unwrap()
        .write_artifact(rows, dir.path(), "bulk_")
        .unwrap();

    let path = artifact.path().to_path_buf();
    assert!(path.starts_with(dir.path()));
    assert_eq!(artifact.line_count(), 6);
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 6);

    artifact.delete().unwrap();
    assert!(!path.exists());
}
