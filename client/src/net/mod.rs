//! Networking modules for HTTP and the real-time chat channel.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` handles REST calls, `socket_client` manages the websocket lifecycle,
//! and `types` defines the HTTP request/response schema.

pub mod api;
pub mod socket_client;
pub mod types;
