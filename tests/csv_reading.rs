use csv_bulk_loader::ingestion::{csv_rows_from_reader, open_csv};
use csv_bulk_loader::types::Value;

#[test]
fn open_csv_prepares_headers_and_types_cells() {
    let rows = open_csv("tests/fixtures/events.csv").unwrap();
    assert_eq!(
        rows.raw_headers(),
        ["id", "id", "event time", "level", "latency.ms"]
    );
    assert_eq!(
        rows.headers(),
        ["id", "id_1", "event_time", "level", "latency_ms"]
    );

    let rows: Vec<_> = rows.collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].get("id"), Some(&Value::Int(1)));
    assert_eq!(rows[0].get("id_1"), Some(&Value::Int(2)));
    assert_eq!(rows[0].get("latency_ms"), Some(&Value::Float(12.5)));
    assert_eq!(rows[1].get("latency_ms"), Some(&Value::Null));
    assert_eq!(rows[2].get("latency_ms"), Some(&Value::Float(f64::INFINITY)));
    assert_eq!(
        rows[3].get("event_time"),
        Some(&Value::Str("not a date".to_string()))
    );
    assert_eq!(rows[4].get("level"), Some(&Value::Null));
}

#[test]
fn short_records_are_padded_and_long_records_skipped() {
    let mut rows = open_csv("tests/fixtures/ragged.csv").unwrap();
    let collected: Vec<_> = rows.by_ref().collect::<Result<_, _>>().unwrap();

    assert_eq!(collected.len(), 2);
    assert_eq!(collected[1].get("name"), Some(&Value::Str("Grace".into())));
    assert_eq!(collected[1].get("active"), Some(&Value::Null));
    assert_eq!(rows.skipped(), 1);
}

#[test]
fn source_column_named_like_the_timestamp_field_is_renamed() {
    let input = "timestamp_field,value\n2024-01-01,1\n";
    let rows = csv_rows_from_reader(input.as_bytes()).unwrap();
    assert_eq!(rows.headers(), ["timestamp_field_1", "value"]);
}

#[test]
fn invalid_utf8_is_replaced_not_rejected() {
    let input: &[u8] = b"name\nab\xffcd\n";
    let rows: Vec<_> = csv_rows_from_reader(input)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows[0].get("name"), Some(&Value::Str("ab\u{fffd}cd".into())));
}

#[test]
fn header_only_input_yields_no_rows() {
    let rows = csv_rows_from_reader("a,b\n".as_bytes()).unwrap();
    assert_eq!(rows.headers(), ["a", "b"]);
    assert_eq!(rows.count(), 0);
}
