use super::*;

// =============================================================
// Engine packets
// =============================================================

#[test]
fn decode_engine_parses_open_handshake() {
    let packet = decode_engine(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#)
        .expect("open should decode");
    let EnginePacket::Open(handshake) = packet else {
        panic!("expected open packet");
    };
    assert_eq!(handshake.sid, "abc");
    assert_eq!(handshake.ping_interval, 25_000);
    assert_eq!(handshake.ping_timeout, 20_000);
    assert_eq!(handshake.max_payload, Some(1_000_000));
}

#[test]
fn decode_engine_maps_single_digit_packets() {
    assert_eq!(decode_engine("1").expect("close"), EnginePacket::Close);
    assert_eq!(decode_engine("2").expect("ping"), EnginePacket::Ping(String::new()));
    assert_eq!(decode_engine("3probe").expect("pong"), EnginePacket::Pong("probe".to_owned()));
    assert_eq!(decode_engine("6").expect("noop"), EnginePacket::Noop);
}

#[test]
fn decode_engine_rejects_empty_and_unknown_frames() {
    assert!(matches!(decode_engine(""), Err(CodecError::Empty)));
    assert!(matches!(decode_engine("9"), Err(CodecError::UnknownEngineType('9'))));
}

#[test]
fn decode_engine_rejects_malformed_open_payload() {
    assert!(matches!(decode_engine("0{not json"), Err(CodecError::Json(_))));
}

#[test]
fn pong_packet_echoes_probe() {
    assert_eq!(pong_packet(""), "3");
    assert_eq!(pong_packet("probe"), "3probe");
}

// =============================================================
// Socket packets
// =============================================================

#[test]
fn decode_socket_parses_event_on_default_namespace() {
    let packet = decode_socket(r#"2["newMessage",{"message":"hi"}]"#).expect("event should decode");
    assert_eq!(
        packet,
        SocketPacket::Event {
            namespace: "/".to_owned(),
            ack_id: None,
            name: "newMessage".to_owned(),
            args: vec![serde_json::json!({"message": "hi"})],
        }
    );
}

#[test]
fn decode_socket_parses_namespace_and_ack_id() {
    let packet = decode_socket(r#"2/chat,17["sendMessage","x"]"#).expect("event should decode");
    let SocketPacket::Event { namespace, ack_id, name, args } = packet else {
        panic!("expected event packet");
    };
    assert_eq!(namespace, "/chat");
    assert_eq!(ack_id, Some(17));
    assert_eq!(name, "sendMessage");
    assert_eq!(args, vec![serde_json::json!("x")]);
}

#[test]
fn decode_socket_parses_connect_with_and_without_payload() {
    assert_eq!(
        decode_socket(r#"0{"sid":"s1"}"#).expect("connect"),
        SocketPacket::Connect { namespace: "/".to_owned(), data: Some(serde_json::json!({"sid": "s1"})) }
    );
    assert_eq!(
        decode_socket("0").expect("connect"),
        SocketPacket::Connect { namespace: "/".to_owned(), data: None }
    );
}

#[test]
fn decode_socket_parses_connect_error_payload() {
    let packet = decode_socket(r#"4{"message":"Authentication error"}"#).expect("connect error");
    assert_eq!(
        packet,
        SocketPacket::ConnectError {
            namespace: "/".to_owned(),
            data: serde_json::json!({"message": "Authentication error"}),
        }
    );
}

#[test]
fn decode_socket_parses_ack() {
    let packet = decode_socket(r#"312[{"ok":true}]"#).expect("ack");
    assert_eq!(
        packet,
        SocketPacket::Ack { namespace: "/".to_owned(), ack_id: 12, args: vec![serde_json::json!({"ok": true})] }
    );
}

#[test]
fn decode_socket_rejects_event_without_name() {
    assert!(matches!(decode_socket("2[]"), Err(CodecError::MissingEventName)));
    assert!(matches!(decode_socket("2[42]"), Err(CodecError::MissingEventName)));
}

#[test]
fn decode_socket_rejects_binary_and_unknown_types() {
    assert!(matches!(decode_socket(r#"51-["x",{"_placeholder":true,"num":0}]"#), Err(CodecError::UnsupportedBinary)));
    assert!(matches!(decode_socket("8"), Err(CodecError::UnknownSocketType('8'))));
}

#[test]
fn encode_socket_event_matches_reference_framing() {
    let packet = SocketPacket::Event {
        namespace: "/".to_owned(),
        ack_id: None,
        name: "sendMessage".to_owned(),
        args: vec![serde_json::json!({"message": "hello"})],
    };
    assert_eq!(encode_socket(&packet), r#"2["sendMessage",{"message":"hello"}]"#);
}

#[test]
fn encode_socket_includes_custom_namespace_and_ack() {
    let packet = SocketPacket::Event {
        namespace: "/admin".to_owned(),
        ack_id: Some(3),
        name: "ping".to_owned(),
        args: Vec::new(),
    };
    assert_eq!(encode_socket(&packet), r#"2/admin,3["ping"]"#);
}

#[test]
fn connect_packet_wraps_auth_in_engine_message() {
    let text = connect_packet(&serde_json::json!({"token": "abc"}));
    assert_eq!(text, r#"40{"token":"abc"}"#);
}

// =============================================================
// Endpoint
// =============================================================

#[test]
fn socket_path_maps_http_schemes_to_websocket() {
    assert_eq!(
        socket_path("https://chat.example.com/"),
        "wss://chat.example.com/socket.io/?EIO=4&transport=websocket"
    );
    assert_eq!(
        socket_path("http://127.0.0.1:5000"),
        "ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket"
    );
}
