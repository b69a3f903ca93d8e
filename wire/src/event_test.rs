use super::*;
use crate::model::MessageBody;

// =============================================================
// decode_inbound: lifecycle
// =============================================================

#[test]
fn decode_inbound_maps_engine_lifecycle() {
    let open = decode_inbound(r#"0{"sid":"e1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#)
        .expect("open should decode");
    assert!(matches!(open, Inbound::Open(ref h) if h.sid == "e1"));
    assert_eq!(decode_inbound("2").expect("ping"), Inbound::Ping(String::new()));
    assert_eq!(decode_inbound("1").expect("close"), Inbound::Closed);
    assert_eq!(decode_inbound("6").expect("noop"), Inbound::Ignored);
}

#[test]
fn decode_inbound_maps_socket_connect_and_disconnect() {
    assert_eq!(
        decode_inbound(r#"40{"sid":"s1"}"#).expect("connect"),
        Inbound::Connected { sid: Some("s1".to_owned()) }
    );
    assert_eq!(decode_inbound("41").expect("disconnect"), Inbound::Disconnected);
}

#[test]
fn decode_inbound_maps_connect_error_message() {
    assert_eq!(
        decode_inbound(r#"44{"message":"Authentication error"}"#).expect("connect error"),
        Inbound::ConnectError { message: "Authentication error".to_owned() }
    );
    assert_eq!(
        decode_inbound("44").expect("connect error"),
        Inbound::ConnectError { message: "connection refused".to_owned() }
    );
}

#[test]
fn decode_inbound_propagates_codec_errors() {
    assert!(decode_inbound("").is_err());
    assert!(decode_inbound("42{").is_err());
}

// =============================================================
// decode_inbound: application events
// =============================================================

#[test]
fn decode_inbound_parses_new_message_event() {
    let inbound = decode_inbound(r#"42["newMessage",{"userId":"u1","name":"Ann","message":"hi","messageType":"text"}]"#)
        .expect("event should decode");
    let Inbound::Event(ServerEvent::NewMessage(msg)) = inbound else {
        panic!("expected newMessage");
    };
    assert_eq!(msg.body, MessageBody::Text("hi".to_owned()));
}

#[test]
fn decode_inbound_parses_roster_and_skips_bad_rows() {
    let inbound = decode_inbound(r#"42["onlineUsers",[{"userId":"u1","name":"Ann"},{"name":"no id"}]]"#)
        .expect("event should decode");
    let Inbound::Event(ServerEvent::OnlineUsers(users)) = inbound else {
        panic!("expected onlineUsers");
    };
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user_id, "u1");
}

#[test]
fn decode_inbound_parses_join_leave_and_upload_error() {
    assert!(matches!(
        decode_inbound(r#"42["userJoined",{"userId":"u2","name":"Bo"}]"#).expect("join"),
        Inbound::Event(ServerEvent::UserJoined(ref u)) if u.name == "Bo"
    ));
    assert!(matches!(
        decode_inbound(r#"42["userLeft",{"userId":"u2","name":"Bo"}]"#).expect("leave"),
        Inbound::Event(ServerEvent::UserLeft(ref u)) if u.user_id == "u2"
    ));
    assert_eq!(
        decode_inbound(r#"42["uploadError",{"message":"too large"}]"#).expect("upload error"),
        Inbound::Event(ServerEvent::UploadError { message: "too large".to_owned() })
    );
}

#[test]
fn decode_inbound_ignores_unknown_events() {
    assert_eq!(decode_inbound(r#"42["typing",{"userId":"u1"}]"#).expect("event"), Inbound::Ignored);
    assert_eq!(decode_inbound(r#"42["newMessage"]"#).expect("event"), Inbound::Ignored);
}

// =============================================================
// ClientEvent
// =============================================================

#[test]
fn send_message_encodes_reference_frame() {
    let event = ClientEvent::SendMessage { message: "hello".to_owned() };
    assert_eq!(event.encode(), r#"42["sendMessage",{"message":"hello"}]"#);
}

#[test]
fn upload_file_payload_uses_camel_case_keys() {
    let event = ClientEvent::UploadFile(FileUpload {
        file: "aGk=".to_owned(),
        file_name: "hi.txt".to_owned(),
        file_type: "text/plain".to_owned(),
    });
    assert_eq!(event.name(), "uploadFile");
    assert_eq!(
        event.payload(),
        serde_json::json!({"file": "aGk=", "fileName": "hi.txt", "fileType": "text/plain"})
    );
}
