use super::*;

fn handshake() -> Inbound {
    wire::decode_inbound(r#"0{"sid":"e1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#)
        .expect("open frame")
}

// =============================================================
// route_inbound
// =============================================================

#[test]
fn open_is_answered_with_authenticated_connect() {
    let auth = serde_json::json!({"token": "abc"});
    assert_eq!(route_inbound(handshake(), &auth), Step::Reply(r#"40{"token":"abc"}"#.to_owned()));
}

#[test]
fn ping_is_answered_with_pong() {
    assert_eq!(
        route_inbound(Inbound::Ping(String::new()), &Value::Null),
        Step::Reply("3".to_owned())
    );
}

#[test]
fn connect_ack_and_events_are_applied() {
    assert_eq!(
        route_inbound(Inbound::Connected { sid: None }, &Value::Null),
        Step::Apply(ChannelEvent::Connected)
    );
    let inbound = wire::decode_inbound(r#"42["uploadError",{"message":"too large"}]"#).expect("event");
    assert!(matches!(
        route_inbound(inbound, &Value::Null),
        Step::Apply(ChannelEvent::Server(wire::ServerEvent::UploadError { .. }))
    ));
}

#[test]
fn connect_error_refuses_and_engine_close_drops() {
    assert_eq!(
        route_inbound(Inbound::ConnectError { message: "Authentication error".to_owned() }, &Value::Null),
        Step::End(RunEnd::Refused("Authentication error".to_owned()))
    );
    assert_eq!(route_inbound(Inbound::Closed, &Value::Null), Step::End(RunEnd::Dropped));
    assert_eq!(route_inbound(Inbound::Ignored, &Value::Null), Step::Skip);
}

#[test]
fn server_disconnect_ends_without_retry() {
    let inbound = wire::decode_inbound("41").expect("disconnect frame");
    assert_eq!(route_inbound(inbound, &Value::Null), Step::End(RunEnd::ServerDisconnect));
}

// =============================================================
// Heartbeat
// =============================================================

#[test]
fn heartbeat_deadline_is_ping_interval_plus_timeout() {
    let Inbound::Open(open) = handshake() else {
        panic!("expected open");
    };
    assert_eq!(heartbeat_deadline_ms(&open), 45_000);
}

#[test]
fn heartbeat_deadline_saturates() {
    let open = wire::OpenHandshake {
        sid: "e1".to_owned(),
        upgrades: Vec::new(),
        ping_interval: u64::MAX,
        ping_timeout: 1,
        max_payload: None,
    };
    assert_eq!(heartbeat_deadline_ms(&open), u64::MAX);
}

#[test]
fn only_handshake_and_pings_reset_heartbeat() {
    assert!(resets_heartbeat(&handshake()));
    assert!(resets_heartbeat(&Inbound::Ping(String::new())));
    assert!(!resets_heartbeat(&Inbound::Connected { sid: None }));
    assert!(!resets_heartbeat(&Inbound::Ignored));
}

// =============================================================
// Backoff
// =============================================================

#[test]
fn backoff_doubles_up_to_cap() {
    let mut delay = INITIAL_BACKOFF_MS;
    let mut seen = Vec::new();
    for _ in 0..5 {
        delay = reconnect_delay(delay, false);
        seen.push(delay);
        delay = next_backoff(delay);
    }
    assert_eq!(seen, [1_000, 2_000, 4_000, 5_000, 5_000]);
}

#[test]
fn successful_connect_resets_backoff() {
    assert_eq!(reconnect_delay(MAX_BACKOFF_MS, true), INITIAL_BACKOFF_MS);
}

// =============================================================
// Frames
// =============================================================

#[test]
fn disconnect_packet_targets_default_namespace() {
    assert_eq!(disconnect_packet(), "41");
}

#[cfg(not(feature = "csr"))]
#[test]
fn handle_without_browser_refuses_emits() {
    let handle = SocketHandle {};
    assert!(!handle.emit(ClientEvent::SendMessage { message: "hi".to_owned() }));
    handle.close();
}
