//! Typed channel events on top of the packet codec.
//!
//! SYSTEM CONTEXT
//! ==============
//! Front ends feed every websocket text frame through [`decode_inbound`] and
//! react to the returned [`Inbound`]; outbound traffic is built from
//! [`ClientEvent`] so event names and payload keys live in one place.

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ChatMessage, OnlineUser, pick_str};
use crate::packet::{
    CodecError, DEFAULT_NAMESPACE, EnginePacket, OpenHandshake, SocketPacket, decode_engine, decode_socket,
    encode_engine, encode_socket,
};

/// Application events pushed by the chat server.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerEvent {
    /// `onlineUsers`: full roster snapshot.
    OnlineUsers(Vec<OnlineUser>),
    /// `newMessage`: one live message.
    NewMessage(ChatMessage),
    /// `userJoined`
    UserJoined(OnlineUser),
    /// `userLeft`
    UserLeft(OnlineUser),
    /// `uploadError`: a previously emitted `uploadFile` failed server side.
    UploadError { message: String },
}

impl ServerEvent {
    /// Map a named socket event onto a typed server event.
    ///
    /// Unknown names and payloads that fail to parse yield `None`.
    #[must_use]
    pub fn from_event(name: &str, args: &[Value]) -> Option<Self> {
        let payload = args.first()?;
        match name {
            "onlineUsers" => {
                let rows = payload.as_array()?;
                let users = rows
                    .iter()
                    .filter_map(|row| serde_json::from_value::<OnlineUser>(row.clone()).ok())
                    .collect();
                Some(Self::OnlineUsers(users))
            }
            "newMessage" => ChatMessage::from_wire(payload).map(Self::NewMessage),
            "userJoined" => serde_json::from_value(payload.clone()).ok().map(Self::UserJoined),
            "userLeft" => serde_json::from_value(payload.clone()).ok().map(Self::UserLeft),
            "uploadError" => {
                let message = payload
                    .as_str()
                    .or_else(|| pick_str(payload, &["message", "error"]))
                    .unwrap_or("upload failed")
                    .to_owned();
                Some(Self::UploadError { message })
            }
            _ => None,
        }
    }
}

/// Everything a websocket text frame can mean to the chat client.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// Engine handshake; the client must now send a socket CONNECT.
    Open(OpenHandshake),
    /// Engine heartbeat; answer with [`crate::pong_packet`].
    Ping(String),
    /// Socket CONNECT acknowledged (`connect`).
    Connected { sid: Option<String> },
    /// Socket CONNECT refused (`connect_error`).
    ConnectError { message: String },
    /// Engine close; the transport is gone.
    Closed,
    /// Socket DISCONNECT sent by the server (`io server disconnect`).
    Disconnected,
    /// A recognized application event.
    Event(ServerEvent),
    /// Valid framing that carries nothing the client acts on.
    Ignored,
}

/// Decode one websocket text frame.
///
/// # Errors
///
/// Returns a [`CodecError`] for malformed engine or socket framing.
pub fn decode_inbound(text: &str) -> Result<Inbound, CodecError> {
    match decode_engine(text)? {
        EnginePacket::Open(handshake) => Ok(Inbound::Open(handshake)),
        EnginePacket::Ping(probe) => Ok(Inbound::Ping(probe)),
        EnginePacket::Close => Ok(Inbound::Closed),
        EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => Ok(Inbound::Ignored),
        EnginePacket::Message(body) => Ok(match decode_socket(&body)? {
            SocketPacket::Connect { data, .. } => Inbound::Connected {
                sid: data
                    .as_ref()
                    .and_then(|d| d.get("sid"))
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            },
            SocketPacket::ConnectError { data, .. } => Inbound::ConnectError {
                message: data
                    .as_str()
                    .or_else(|| pick_str(&data, &["message"]))
                    .unwrap_or("connection refused")
                    .to_owned(),
            },
            SocketPacket::Disconnect { .. } => Inbound::Disconnected,
            SocketPacket::Event { name, args, .. } => {
                ServerEvent::from_event(&name, &args).map_or(Inbound::Ignored, Inbound::Event)
            }
            SocketPacket::Ack { .. } => Inbound::Ignored,
        }),
    }
}

/// Payload of an `uploadFile` emit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    /// Base64-encoded file bytes (no data-URL prefix).
    pub file: String,
    pub file_name: String,
    pub file_type: String,
}

/// Events emitted by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientEvent {
    SendMessage { message: String },
    UploadFile(FileUpload),
}

impl ClientEvent {
    /// Socket event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendMessage { .. } => "sendMessage",
            Self::UploadFile(_) => "uploadFile",
        }
    }

    /// JSON argument sent with the event.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::SendMessage { message } => serde_json::json!({ "message": message }),
            Self::UploadFile(upload) => serde_json::to_value(upload).unwrap_or(Value::Null),
        }
    }

    /// Full websocket text frame for this event.
    #[must_use]
    pub fn encode(&self) -> String {
        encode_engine(&EnginePacket::Message(encode_socket(&SocketPacket::Event {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            ack_id: None,
            name: self.name().to_owned(),
            args: vec![self.payload()],
        })))
    }
}
