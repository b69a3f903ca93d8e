//! Shared wire model and Socket.IO packet codec for the group chat channel.
//!
//! This crate owns the representation used by both `client` and `cli`. The
//! backend speaks Socket.IO v5 over an Engine.IO v4 websocket, so every text
//! frame is a one-digit engine packet type, optionally wrapping a socket
//! packet (`42["newMessage", {...}]`). Payloads stay loosely typed on the
//! wire and are converted into tagged Rust types exactly once, in
//! [`decode_inbound`] and [`ChatMessage::from_wire`].

mod event;
mod model;
mod packet;

pub use event::{ClientEvent, FileUpload, Inbound, ServerEvent, decode_inbound};
pub use model::{ChatMessage, FileDisplay, FileRef, MessageBody, OnlineUser, User};
pub use packet::{
    CodecError, DEFAULT_NAMESPACE, EnginePacket, OpenHandshake, SocketPacket, connect_packet, decode_engine,
    decode_socket, encode_engine, encode_socket, pong_packet, socket_path,
};
