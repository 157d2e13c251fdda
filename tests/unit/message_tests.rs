//! Unit tests for wire message envelopes.

use serde_json::json;

use dap_link::protocol::{EventMessage, ProtocolMessage, RequestMessage, ResponseMessage};

// ── Serialization shape ──────────────────────────────────────────────────────

#[test]
fn request_serializes_with_lowercase_type_tag() {
    let message = ProtocolMessage::Request(RequestMessage {
        seq: 1,
        command: "initialize".to_owned(),
        arguments: Some(json!({"adapterID": "mock"})),
    });

    let value = serde_json::to_value(&message).expect("serialization must succeed");

    assert_eq!(value["type"], "request");
    assert_eq!(value["seq"], 1);
    assert_eq!(value["command"], "initialize");
    assert_eq!(value["arguments"]["adapterID"], "mock");
}

#[test]
fn absent_optional_fields_are_omitted_from_the_wire() {
    let request = serde_json::to_string(&ProtocolMessage::Request(RequestMessage {
        seq: 1,
        command: "threads".to_owned(),
        arguments: None,
    }))
    .expect("serialization must succeed");
    assert!(
        !request.contains("arguments"),
        "absent arguments must not appear: {request}"
    );

    let response = serde_json::to_string(&ProtocolMessage::Response(ResponseMessage {
        seq: 2,
        request_seq: 1,
        success: true,
        command: "threads".to_owned(),
        message: None,
        body: None,
    }))
    .expect("serialization must succeed");
    assert!(!response.contains("\"message\""), "got: {response}");
    assert!(!response.contains("\"body\""), "got: {response}");
}

#[test]
fn event_round_trips_through_json() {
    let original = ProtocolMessage::Event(EventMessage {
        seq: 3,
        event: "output".to_owned(),
        body: Some(json!({"category": "stdout", "output": "hello\n"})),
    });

    let text = serde_json::to_string(&original).expect("serialization must succeed");
    let parsed: ProtocolMessage = serde_json::from_str(&text).expect("parse must succeed");

    assert_eq!(parsed, original);
}

#[test]
fn inbound_response_with_error_text_parses() {
    let raw = r#"{
        "seq": 12,
        "type": "response",
        "request_seq": 4,
        "success": false,
        "command": "evaluate",
        "message": "not available",
        "body": {"error": {"id": 100}}
    }"#;

    match serde_json::from_str::<ProtocolMessage>(raw).expect("parse must succeed") {
        ProtocolMessage::Response(response) => {
            assert_eq!(response.request_seq, 4);
            assert!(!response.success);
            assert_eq!(response.message.as_deref(), Some("not available"));
        }
        other => panic!("expected a response, got: {other:?}"),
    }
}

#[test]
fn unknown_type_tag_fails_to_parse() {
    let raw = r#"{"seq": 1, "type": "banana"}"#;
    assert!(serde_json::from_str::<ProtocolMessage>(raw).is_err());
}

// ── Constructors ─────────────────────────────────────────────────────────────

#[test]
fn reply_to_copies_command_and_correlates() {
    let request = RequestMessage {
        seq: 9,
        command: "scopes".to_owned(),
        arguments: None,
    };

    let response = ResponseMessage::reply_to(&request).with_body(json!({"scopes": []}));

    assert_eq!(response.seq, 0, "seq is assigned by the session on send");
    assert_eq!(response.request_seq, 9);
    assert_eq!(response.command, "scopes");
    assert!(response.success);
    assert_eq!(response.body, Some(json!({"scopes": []})));
}

#[test]
fn reject_carries_the_error_text() {
    let request = RequestMessage {
        seq: 2,
        command: "attach".to_owned(),
        arguments: None,
    };

    let response = ResponseMessage::reject(&request, "attach is not supported");

    assert!(!response.success);
    assert_eq!(response.message.as_deref(), Some("attach is not supported"));
    assert_eq!(response.request_seq, 2);
}

#[test]
fn seq_accessor_covers_all_variants() {
    let request = ProtocolMessage::Request(RequestMessage {
        seq: 1,
        command: "a".to_owned(),
        arguments: None,
    });
    let response = ProtocolMessage::Response(ResponseMessage {
        seq: 2,
        request_seq: 1,
        success: true,
        command: "a".to_owned(),
        message: None,
        body: None,
    });
    let event = ProtocolMessage::Event(EventMessage {
        seq: 3,
        event: "b".to_owned(),
        body: None,
    });

    assert_eq!(request.seq(), 1);
    assert_eq!(response.seq(), 2);
    assert_eq!(event.seq(), 3);
}
