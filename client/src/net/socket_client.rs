//! Socket.IO channel client for the group chat.
//!
//! The client opens `{socket_url}/socket.io/?EIO=4&transport=websocket`,
//! answers the engine handshake with a CONNECT carrying the auth payload,
//! replies to heartbeats and forwards every decoded event into
//! [`ChatState`](crate::state::chat::ChatState). Dropped connections are
//! retried with exponential backoff (1 s doubling up to 5 s); a refused
//! CONNECT, a server DISCONNECT or an explicit close ends the loop. A
//! connection that stays silent for longer than `pingInterval + pingTimeout`
//! is treated as dropped.
//!
//! All websocket logic is gated behind `#[cfg(feature = "csr")]`; the
//! routing helpers are pure and tested natively.
//!
//! ERROR HANDLING
//! ==============
//! Transport and decode failures are logged and turned into status updates.
//! Emits that cannot be delivered are reported back to the chat state so the
//! user sees an alert instead of a silent loss.

#[cfg(test)]
#[path = "socket_client_test.rs"]
mod socket_client_test;

use serde_json::Value;
use wire::{
    ClientEvent, DEFAULT_NAMESPACE, EnginePacket, Inbound, OpenHandshake, SocketPacket, connect_packet, pong_packet,
};

use crate::state::chat::ChannelEvent;
#[cfg(feature = "csr")]
use crate::state::chat::ChatState;
#[cfg(feature = "csr")]
use leptos::prelude::{RwSignal, Update};

pub const INITIAL_BACKOFF_MS: u32 = 1_000;
pub const MAX_BACKOFF_MS: u32 = 5_000;
/// Wait for the engine handshake before one is received.
pub const HANDSHAKE_TIMEOUT_MS: u64 = 20_000;

/// Why one connection attempt ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RunEnd {
    /// Transport closed or failed; retry after backoff.
    Dropped,
    /// Server rejected the CONNECT; do not retry.
    Refused(String),
    /// Server sent a socket DISCONNECT; do not retry.
    ServerDisconnect,
    /// The page asked for shutdown.
    Closed,
}

/// What to do with one decoded inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Step {
    Reply(String),
    Apply(ChannelEvent),
    End(RunEnd),
    Skip,
}

pub(crate) fn route_inbound(inbound: Inbound, auth: &Value) -> Step {
    match inbound {
        Inbound::Open(_) => Step::Reply(connect_packet(auth)),
        Inbound::Ping(probe) => Step::Reply(pong_packet(&probe)),
        Inbound::Connected { .. } => Step::Apply(ChannelEvent::Connected),
        Inbound::ConnectError { message } => Step::End(RunEnd::Refused(message)),
        Inbound::Closed => Step::End(RunEnd::Dropped),
        Inbound::Disconnected => Step::End(RunEnd::ServerDisconnect),
        Inbound::Event(event) => Step::Apply(ChannelEvent::Server(event)),
        Inbound::Ignored => Step::Skip,
    }
}

/// Silence allowed after a handshake or ping before the link is presumed dead.
#[cfg_attr(not(feature = "csr"), allow(dead_code))]
pub(crate) fn heartbeat_deadline_ms(handshake: &OpenHandshake) -> u64 {
    handshake.ping_interval.saturating_add(handshake.ping_timeout)
}

/// Whether `inbound` restarts the heartbeat deadline.
#[cfg_attr(not(feature = "csr"), allow(dead_code))]
pub(crate) fn resets_heartbeat(inbound: &Inbound) -> bool {
    matches!(inbound, Inbound::Open(_) | Inbound::Ping(_))
}

/// Delay before the next attempt.
///
/// A run that reached `connect` starts over at the initial delay.
pub(crate) fn reconnect_delay(current_ms: u32, was_connected: bool) -> u32 {
    if was_connected { INITIAL_BACKOFF_MS } else { current_ms.min(MAX_BACKOFF_MS) }
}

pub(crate) fn next_backoff(current_ms: u32) -> u32 {
    current_ms.saturating_mul(2).min(MAX_BACKOFF_MS)
}

/// Socket DISCONNECT frame for the default namespace.
pub(crate) fn disconnect_packet() -> String {
    wire::encode_engine(&EnginePacket::Message(wire::encode_socket(&SocketPacket::Disconnect {
        namespace: DEFAULT_NAMESPACE.to_owned(),
    })))
}

#[cfg_attr(not(feature = "csr"), allow(dead_code))]
enum Outbound {
    Emit(ClientEvent),
    Close,
}

/// Page-owned handle to a running channel. Closing it ends the loop.
#[derive(Clone, Debug)]
pub struct SocketHandle {
    #[cfg(feature = "csr")]
    tx: futures::channel::mpsc::UnboundedSender<Outbound>,
}

impl std::fmt::Debug for Outbound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Emit(event) => write!(f, "Emit({})", event.name()),
            Self::Close => f.write_str("Close"),
        }
    }
}

impl SocketHandle {
    /// Queue an emit. Returns `false` when the channel has already shut down.
    pub fn emit(&self, event: ClientEvent) -> bool {
        #[cfg(feature = "csr")]
        {
            self.tx.unbounded_send(Outbound::Emit(event)).is_ok()
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = event;
            false
        }
    }

    /// Close the channel. Safe to call more than once.
    pub fn close(&self) {
        #[cfg(feature = "csr")]
        {
            let _ = self.tx.unbounded_send(Outbound::Close);
            self.tx.close_channel();
        }
    }
}

/// Emit `event`, reporting a failed hand-off to the chat state.
#[cfg(feature = "csr")]
pub fn send_event(handle: &SocketHandle, chat: RwSignal<ChatState>, event: ClientEvent) {
    if !handle.emit(event.clone()) {
        let _ = chat.try_update(|c| c.emit_dropped(&event));
    }
}

/// Read, encode and emit each staged file concurrently.
#[cfg(feature = "csr")]
pub fn send_attachments(
    handle: &SocketHandle,
    chat: RwSignal<ChatState>,
    attachments: Vec<crate::state::attachments::PendingAttachment<web_sys::File>>,
) {
    for attachment in attachments {
        chat.update(|c| c.start_upload(&attachment.local_id, &attachment.name));
        let handle = handle.clone();
        leptos::task::spawn_local(async move {
            match crate::util::files::read_bytes(&attachment.handle).await {
                Ok(bytes) => {
                    let upload =
                        crate::state::attachments::encode_upload(&bytes, &attachment.name, &attachment.mime_type);
                    send_event(&handle, chat, ClientEvent::UploadFile(upload));
                }
                Err(e) => {
                    leptos::logging::warn!("reading {} failed: {e}", attachment.name);
                    let _ = chat.try_update(|c| c.upload_read_failed(&attachment.local_id, &attachment.name));
                }
            }
        });
    }
}

/// Spawn the channel lifecycle as a local async task.
#[cfg(feature = "csr")]
pub fn spawn_socket_client(
    socket_url: &str,
    auth: Value,
    self_user_id: String,
    chat: RwSignal<ChatState>,
) -> SocketHandle {
    let (tx, rx) = futures::channel::mpsc::unbounded::<Outbound>();
    let url = wire::socket_path(socket_url);
    leptos::task::spawn_local(socket_loop(url, auth, self_user_id, chat, rx));
    SocketHandle { tx }
}

#[cfg(feature = "csr")]
fn apply(chat: RwSignal<ChatState>, event: ChannelEvent, self_user_id: &str) {
    let now = chrono::Utc::now();
    let _ = chat.try_update(|c| c.apply(event, self_user_id, now));
}

/// Main connection loop with reconnect logic.
#[cfg(feature = "csr")]
async fn socket_loop(
    url: String,
    auth: Value,
    self_user_id: String,
    chat: RwSignal<ChatState>,
    mut rx: futures::channel::mpsc::UnboundedReceiver<Outbound>,
) {
    use futures::StreamExt;
    use futures::future::{Either, select};

    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        apply(chat, ChannelEvent::Connecting, &self_user_id);

        let (end, was_connected) = connect_and_run(&url, &auth, &self_user_id, chat, &mut rx).await;
        match end {
            RunEnd::Closed => {
                leptos::logging::log!("chat channel closed");
                return;
            }
            RunEnd::Refused(reason) => {
                leptos::logging::warn!("chat connection refused: {reason}");
                apply(chat, ChannelEvent::ConnectError(reason), &self_user_id);
                return;
            }
            RunEnd::ServerDisconnect => {
                leptos::logging::warn!("chat server closed the session");
                apply(chat, ChannelEvent::Disconnected, &self_user_id);
                return;
            }
            RunEnd::Dropped => apply(chat, ChannelEvent::Disconnected, &self_user_id),
        }

        let delay_ms = reconnect_delay(backoff_ms, was_connected);
        backoff_ms = next_backoff(delay_ms);

        // Wait out the delay, still honouring shutdown.
        let mut sleep = gloo_timers::future::sleep(std::time::Duration::from_millis(u64::from(delay_ms)));
        loop {
            match select(sleep, rx.next()).await {
                Either::Left(((), _)) => break,
                Either::Right((Some(Outbound::Emit(event)), pending_sleep)) => {
                    let _ = chat.try_update(|c| c.emit_dropped(&event));
                    sleep = pending_sleep;
                }
                Either::Right((Some(Outbound::Close) | None, _)) => return,
            }
        }
    }
}

/// Connect to the websocket and process traffic until the run ends.
///
/// Returns how the run ended and whether `connect` was reached.
#[cfg(feature = "csr")]
async fn connect_and_run(
    url: &str,
    auth: &Value,
    self_user_id: &str,
    chat: RwSignal<ChatState>,
    rx: &mut futures::channel::mpsc::UnboundedReceiver<Outbound>,
) -> (RunEnd, bool) {
    use futures::future::{Either, select};
    use futures::{SinkExt, StreamExt};
    use gloo_net::websocket::Message;
    use gloo_net::websocket::futures::WebSocket;
    use std::time::Duration;

    let ws = match WebSocket::open(url) {
        Ok(ws) => ws,
        Err(e) => {
            leptos::logging::warn!("chat socket open failed: {e}");
            return (RunEnd::Dropped, false);
        }
    };
    let (mut ws_write, mut ws_read) = ws.split();
    let mut connected = false;
    let mut silence_ms = HANDSHAKE_TIMEOUT_MS;
    let mut last_beat = js_sys::Date::now();

    loop {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let elapsed_ms = (js_sys::Date::now() - last_beat).max(0.0) as u64;
        let wake = {
            let traffic = select(ws_read.next(), rx.next());
            let wait_ms = silence_ms.saturating_sub(elapsed_ms).min(u64::from(u32::MAX));
            let timer = gloo_timers::future::sleep(Duration::from_millis(wait_ms));
            match select(traffic, timer).await {
                Either::Left((Either::Left((frame, _)), _)) => Wake::Frame(frame),
                Either::Left((Either::Right((outbound, _)), _)) => Wake::Outbound(outbound),
                Either::Right(((), _)) => Wake::Silent,
            }
        };

        match wake {
            Wake::Silent => {
                leptos::logging::warn!("chat heartbeat missed for {silence_ms} ms");
                let _ = ws_write.close().await;
                return (RunEnd::Dropped, connected);
            }
            Wake::Frame(frame) => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Bytes(_))) => continue,
                    Some(Err(e)) => {
                        leptos::logging::warn!("chat socket error: {e}");
                        return (RunEnd::Dropped, connected);
                    }
                    None => return (RunEnd::Dropped, connected),
                };
                let inbound = match wire::decode_inbound(&text) {
                    Ok(inbound) => inbound,
                    Err(e) => {
                        leptos::logging::warn!("undecodable chat frame: {e}");
                        continue;
                    }
                };
                if let Inbound::Open(handshake) = &inbound {
                    silence_ms = heartbeat_deadline_ms(handshake);
                }
                if resets_heartbeat(&inbound) {
                    last_beat = js_sys::Date::now();
                }
                match route_inbound(inbound, auth) {
                    Step::Reply(reply) => {
                        if ws_write.send(Message::Text(reply)).await.is_err() {
                            return (RunEnd::Dropped, connected);
                        }
                    }
                    Step::Apply(event) => {
                        if event == ChannelEvent::Connected {
                            connected = true;
                        }
                        apply(chat, event, self_user_id);
                    }
                    Step::End(end) => return (end, connected),
                    Step::Skip => {}
                }
            }
            Wake::Outbound(outbound) => match outbound {
                Some(Outbound::Emit(event)) => {
                    if !connected {
                        let _ = chat.try_update(|c| c.emit_dropped(&event));
                        continue;
                    }
                    if ws_write.send(Message::Text(event.encode())).await.is_err() {
                        let _ = chat.try_update(|c| c.emit_dropped(&event));
                        return (RunEnd::Dropped, connected);
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = ws_write.send(Message::Text(disconnect_packet())).await;
                    let _ = ws_write.close().await;
                    return (RunEnd::Closed, connected);
                }
            },
        }
    }
}

/// What woke one iteration of the connection loop.
#[cfg(feature = "csr")]
enum Wake {
    Frame(Option<Result<gloo_net::websocket::Message, gloo_net::websocket::WebSocketError>>),
    Outbound(Option<Outbound>),
    Silent,
}
