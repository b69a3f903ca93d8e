//! Engine.IO v4 and Socket.IO v5 text packet codec.
//!
//! Only the text encoding is supported. Binary event/ack packets (types `5`
//! and `6`) are rejected; uploads travel as base64 strings inside ordinary
//! events.

#[cfg(test)]
#[path = "packet_test.rs"]
mod packet_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Namespace used when a socket packet carries none.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Error returned by [`decode_engine`] and [`decode_socket`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame carried no bytes at all.
    #[error("empty packet")]
    Empty,
    /// The leading engine packet type is not one of `0`..=`6`.
    #[error("unknown engine packet type: {0:?}")]
    UnknownEngineType(char),
    /// The leading socket packet type is not one of `0`..=`6`.
    #[error("unknown socket packet type: {0:?}")]
    UnknownSocketType(char),
    /// Binary socket packets need out-of-band attachments we never negotiate.
    #[error("binary socket packets are not supported")]
    UnsupportedBinary,
    /// An event packet's argument array was empty or did not start with a name.
    #[error("event packet is missing its name")]
    MissingEventName,
    /// An ack packet did not carry an ack id.
    #[error("ack packet is missing its id")]
    MissingAckId,
    /// The JSON portion of a packet failed to parse.
    #[error("invalid packet payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Payload of the engine `open` packet sent by the server right after the
/// websocket upgrade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    /// Engine session id.
    pub sid: String,
    /// Transports the server would upgrade to (empty for websocket).
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Interval between server pings in milliseconds.
    pub ping_interval: u64,
    /// Time the server waits for a pong before dropping the session.
    pub ping_timeout: u64,
    /// Largest payload the server accepts, in bytes.
    #[serde(default)]
    pub max_payload: Option<u64>,
}

/// One Engine.IO packet.
#[derive(Clone, Debug, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    /// Carries an encoded [`SocketPacket`].
    Message(String),
    Upgrade,
    Noop,
}

/// One Socket.IO packet.
#[derive(Clone, Debug, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack_id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Value,
    },
}

/// Decode a websocket text frame into an engine packet.
///
/// # Errors
///
/// Returns [`CodecError::Empty`] for an empty frame,
/// [`CodecError::UnknownEngineType`] for an unknown leading digit and
/// [`CodecError::Json`] for a malformed `open` handshake.
pub fn decode_engine(text: &str) -> Result<EnginePacket, CodecError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    let rest = chars.as_str();
    match kind {
        '0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(rest.to_owned())),
        '3' => Ok(EnginePacket::Pong(rest.to_owned())),
        '4' => Ok(EnginePacket::Message(rest.to_owned())),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(CodecError::UnknownEngineType(other)),
    }
}

/// Encode an engine packet into websocket text.
#[must_use]
pub fn encode_engine(packet: &EnginePacket) -> String {
    match packet {
        EnginePacket::Open(handshake) => {
            format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
        }
        EnginePacket::Close => "1".to_owned(),
        EnginePacket::Ping(data) => format!("2{data}"),
        EnginePacket::Pong(data) => format!("3{data}"),
        EnginePacket::Message(data) => format!("4{data}"),
        EnginePacket::Upgrade => "5".to_owned(),
        EnginePacket::Noop => "6".to_owned(),
    }
}

/// Decode the body of an engine `message` packet into a socket packet.
///
/// # Errors
///
/// Returns a [`CodecError`] when the type digit is unknown or binary, the JSON
/// body is malformed, or an event/ack lacks its required parts.
pub fn decode_socket(text: &str) -> Result<SocketPacket, CodecError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    let mut rest = chars.as_str();

    if matches!(kind, '5' | '6') {
        return Err(CodecError::UnsupportedBinary);
    }
    if !matches!(kind, '0'..='4') {
        return Err(CodecError::UnknownSocketType(kind));
    }

    let namespace = if rest.starts_with('/') {
        let end = rest.find(',').unwrap_or(rest.len());
        let namespace = rest[..end].to_owned();
        rest = rest.get(end + 1..).unwrap_or("");
        namespace
    } else {
        DEFAULT_NAMESPACE.to_owned()
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let ack_id = if digits > 0 { rest[..digits].parse::<u64>().ok() } else { None };
    let body = &rest[digits..];

    match kind {
        '0' => {
            let data = if body.is_empty() { None } else { Some(serde_json::from_str(body)?) };
            Ok(SocketPacket::Connect { namespace, data })
        }
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' => {
            let mut args = parse_args(body)?;
            if args.is_empty() {
                return Err(CodecError::MissingEventName);
            }
            let Value::String(name) = args.remove(0) else {
                return Err(CodecError::MissingEventName);
            };
            Ok(SocketPacket::Event { namespace, ack_id, name, args })
        }
        '3' => {
            let ack_id = ack_id.ok_or(CodecError::MissingAckId)?;
            Ok(SocketPacket::Ack { namespace, ack_id, args: parse_args(body)? })
        }
        _ => {
            let data = if body.is_empty() { Value::Null } else { serde_json::from_str(body)? };
            Ok(SocketPacket::ConnectError { namespace, data })
        }
    }
}

fn parse_args(body: &str) -> Result<Vec<Value>, CodecError> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str::<Vec<Value>>(body)?)
}

/// Encode a socket packet (without the engine `4` prefix).
#[must_use]
pub fn encode_socket(packet: &SocketPacket) -> String {
    let (kind, namespace) = match packet {
        SocketPacket::Connect { namespace, .. } => ('0', namespace),
        SocketPacket::Disconnect { namespace } => ('1', namespace),
        SocketPacket::Event { namespace, .. } => ('2', namespace),
        SocketPacket::Ack { namespace, .. } => ('3', namespace),
        SocketPacket::ConnectError { namespace, .. } => ('4', namespace),
    };

    let mut out = String::new();
    out.push(kind);
    if namespace != DEFAULT_NAMESPACE {
        out.push_str(namespace);
        out.push(',');
    }

    match packet {
        SocketPacket::Connect { data, .. } => {
            if let Some(data) = data {
                out.push_str(&data.to_string());
            }
        }
        SocketPacket::Disconnect { .. } => {}
        SocketPacket::Event { ack_id, name, args, .. } => {
            if let Some(id) = ack_id {
                out.push_str(&id.to_string());
            }
            let mut items = Vec::with_capacity(args.len() + 1);
            items.push(Value::String(name.clone()));
            items.extend(args.iter().cloned());
            out.push_str(&Value::Array(items).to_string());
        }
        SocketPacket::Ack { ack_id, args, .. } => {
            out.push_str(&ack_id.to_string());
            out.push_str(&Value::Array(args.clone()).to_string());
        }
        SocketPacket::ConnectError { data, .. } => out.push_str(&data.to_string()),
    }
    out
}

/// Full websocket text for a CONNECT on the default namespace carrying `auth`.
#[must_use]
pub fn connect_packet(auth: &Value) -> String {
    encode_engine(&EnginePacket::Message(encode_socket(&SocketPacket::Connect {
        namespace: DEFAULT_NAMESPACE.to_owned(),
        data: Some(auth.clone()),
    })))
}

/// Full websocket text answering a server ping.
#[must_use]
pub fn pong_packet(probe: &str) -> String {
    encode_engine(&EnginePacket::Pong(probe.to_owned()))
}

/// Build the websocket endpoint for a Socket.IO server rooted at `base_url`.
///
/// `http`/`https` schemes are mapped to `ws`/`wss`; anything else is kept.
#[must_use]
pub fn socket_path(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_owned()
    };
    format!("{base}/socket.io/?EIO=4&transport=websocket")
}
