use std::path::PathBuf;

use serde_json::{json, Value};
use singer_messages::{ErrorKind, Message, MessageError, MessageParser};
use time::macros::datetime;

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("messages")
        .join("v1")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_root().join(name);
    std::fs::read_to_string(path).expect("read fixture")
}

fn parse_fixture(name: &str) -> Result<Message, MessageError> {
    let parser = MessageParser::new();
    let text = read_fixture(name);
    let line = text
        .lines()
        .find(|l| !l.chars().all(|c| c.is_whitespace()))
        .unwrap();
    parser.parse_line(line).map(|m| m.unwrap())
}

#[test]
fn record_fixture_recovers_required_fields() {
    let Message::Record(record) = parse_fixture("record_minimal.jsonl").unwrap() else {
        panic!("expected RECORD");
    };
    assert_eq!(record.stream, "streamValue");
    assert_eq!(
        Value::Object(record.record),
        json!({"name": "foo", "id": 12})
    );
    assert!(record.version.is_empty());
    assert!(record.time_extracted.is_none());
}

#[test]
fn record_fixture_recovers_optionals_and_exact_numbers() {
    let Message::Record(record) = parse_fixture("record_extras.jsonl").unwrap() else {
        panic!("expected RECORD");
    };
    assert_eq!(record.version, "1700000000");
    assert_eq!(
        record.time_extracted,
        Some(datetime!(2000-01-01 0:00 -5))
    );
    let encoded = serde_json::to_string(&record.record).unwrap();
    assert_eq!(
        encoded,
        r#"{"id":1,"price":12.50,"big":123456789012345678901234567890}"#
    );
}

#[test]
fn schema_fixtures_recover_property_lists() {
    let Message::Schema(schema) = parse_fixture("schema.jsonl").unwrap() else {
        panic!("expected SCHEMA");
    };
    assert_eq!(schema.stream, "users");
    assert_eq!(schema.key_properties, ["name"]);
    assert!(schema.bookmark_properties.is_empty());
    assert_eq!(
        Value::Object(schema.schema),
        json!({"type": "object", "properties": {"name": {"type": "string"}}})
    );

    let Message::Schema(schema) = parse_fixture("schema_bookmarks.jsonl").unwrap() else {
        panic!("expected SCHEMA");
    };
    assert_eq!(schema.bookmark_properties, ["updated_at", "name"]);
}

#[test]
fn state_fixture_ignores_key_order() {
    let Message::State(state) = parse_fixture("state.jsonl").unwrap() else {
        panic!("expected STATE");
    };
    assert_eq!(Value::Object(state.value), json!({"users": 2, "locations": 1}));
}

#[test]
fn activate_version_is_a_recognised_kind() {
    let Message::ActivateVersion(msg) = parse_fixture("activate_version.jsonl").unwrap() else {
        panic!("expected ACTIVATE_VERSION");
    };
    assert_eq!(msg.stream, "users");
    assert_eq!(msg.version, "1700000000");
}

#[test]
fn missing_required_fields_are_typed_errors() {
    match parse_fixture("missing_stream.jsonl") {
        Err(MessageError::MissingField(field)) => assert_eq!(field, "stream"),
        other => panic!("unexpected: {other:?}"),
    }
    match parse_fixture("missing_type.jsonl") {
        Err(MessageError::MissingField(field)) => assert_eq!(field, "type"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn unknown_type_is_error_not_panic() {
    let err = parse_fixture("unknown_type.jsonl").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownMessageType);
    assert_eq!(err.to_string(), "unknown message type `BATCH`");
}

#[test]
fn blank_lines_are_ignored_and_crlf_is_tolerated() {
    let parser = MessageParser::new();
    let text = read_fixture("blank_lines.jsonl");
    let count = text
        .lines()
        .filter(|line| matches!(parser.parse_line(line), Ok(Some(_))))
        .count();
    assert_eq!(count, 2);

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let with_crlf = format!("{line}\r");
        assert!(parser.parse_line(&with_crlf).unwrap().is_some());
    }
}
