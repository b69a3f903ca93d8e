//! Group chat state: connection status, message list, roster and uploads.
//!
//! SYSTEM CONTEXT
//! ==============
//! `socket_client` translates websocket frames into [`ChannelEvent`]s and
//! feeds them to [`ChatState::apply`]; the chat page seeds history over HTTP
//! and renders straight from this state.
//!
//! DESIGN
//! ======
//! Live messages that arrive while history is loading are buffered. When
//! history lands, buffered entries whose server id is already in the history
//! are dropped and the rest are appended in arrival order, so the list never
//! shows a message twice and never loses one that raced the fetch.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use wire::{ChatMessage, ClientEvent, OnlineUser, ServerEvent};

use super::attachments::UploadTracker;
use super::session::Session;

/// Channel connection status used to gate the send controls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HistoryState {
    /// No fetch started; live messages append directly.
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Everything the connection manager reports to the chat state.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    Connecting,
    Connected,
    Disconnected,
    ConnectError(String),
    Server(ServerEvent),
}

/// Outcome of the access check run before a channel is opened.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatAccess {
    SignedOut,
    /// Signed in without a group membership: the chat view is not shown.
    NotMember,
    /// Open the channel, authenticating with this CONNECT payload.
    Open { auth: Value },
}

/// Decide whether the chat channel may be opened for `session`.
pub fn plan_connection(session: Option<&Session>, token: Option<String>) -> ChatAccess {
    match session {
        None => ChatAccess::SignedOut,
        Some(session) if !session.is_group_member => ChatAccess::NotMember,
        Some(_) => {
            let auth = token.map_or_else(|| serde_json::json!({}), |token| serde_json::json!({ "token": token }));
            ChatAccess::Open { auth }
        }
    }
}

/// Build the `sendMessage` emit for the composer contents, if sendable.
pub fn outgoing_text(input: &str, status: ConnectionStatus) -> Option<ClientEvent> {
    let message = input.trim();
    if message.is_empty() || status != ConnectionStatus::Connected {
        return None;
    }
    Some(ClientEvent::SendMessage { message: message.to_owned() })
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatState {
    pub connection: ConnectionStatus,
    /// Last `connect_error` reason, cleared on connect.
    pub connect_error: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub online_users: Vec<OnlineUser>,
    pub history: HistoryState,
    pub uploads: UploadTracker,
    /// Pending user-visible alerts, oldest first.
    pub alerts: Vec<String>,
    buffered: Vec<ChatMessage>,
}

impl ChatState {
    pub fn can_send(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }

    pub fn is_uploading(&self) -> bool {
        self.uploads.is_uploading()
    }

    // =============================================================
    // History
    // =============================================================

    pub fn begin_history(&mut self) {
        self.history = HistoryState::Loading;
    }

    /// Install fetched history and reconcile anything that arrived meanwhile.
    pub fn seed_history(&mut self, history: Vec<ChatMessage>) {
        let known: HashSet<String> = history.iter().filter_map(|m| m.id.clone()).collect();
        let mut live = std::mem::take(&mut self.messages);
        live.append(&mut self.buffered);

        self.messages = history;
        self.messages.extend(
            live.into_iter()
                .filter(|m| m.id.as_ref().is_none_or(|id| !known.contains(id))),
        );
        self.history = HistoryState::Loaded;
    }

    /// History could not be fetched; live traffic still shows.
    pub fn history_failed(&mut self, message: impl Into<String>) {
        self.messages.append(&mut self.buffered);
        self.history = HistoryState::Failed(message.into());
    }

    // =============================================================
    // Channel events
    // =============================================================

    pub fn apply(&mut self, event: ChannelEvent, self_user_id: &str, now: DateTime<Utc>) {
        match event {
            ChannelEvent::Connecting => self.connection = ConnectionStatus::Connecting,
            ChannelEvent::Connected => {
                self.connection = ConnectionStatus::Connected;
                self.connect_error = None;
            }
            ChannelEvent::Disconnected => {
                self.connection = ConnectionStatus::Disconnected;
                let dropped = self.uploads.fail_all();
                if dropped > 0 {
                    self.alerts.push(format!("Connection lost before {dropped} upload(s) finished"));
                }
            }
            ChannelEvent::ConnectError(reason) => {
                self.connection = ConnectionStatus::Disconnected;
                self.connect_error = Some(reason);
            }
            ChannelEvent::Server(event) => self.apply_server_event(event, self_user_id, now),
        }
    }

    fn apply_server_event(&mut self, event: ServerEvent, self_user_id: &str, now: DateTime<Utc>) {
        match event {
            ServerEvent::OnlineUsers(users) => {
                self.online_users.clear();
                for user in users {
                    self.upsert_user(user);
                }
            }
            ServerEvent::NewMessage(message) => {
                self.uploads.complete_echo(&message, self_user_id);
                self.push_live(message);
            }
            ServerEvent::UserJoined(user) => {
                let notice = format!("{} joined the chat", user.name);
                self.upsert_user(user);
                self.push_live(ChatMessage::system(notice, Some(now)));
            }
            ServerEvent::UserLeft(user) => {
                self.online_users.retain(|u| u.user_id != user.user_id);
                self.push_live(ChatMessage::system(format!("{} left the chat", user.name), Some(now)));
            }
            ServerEvent::UploadError { message } => {
                self.uploads.fail_all();
                self.alerts.push(format!("File upload failed: {message}"));
            }
        }
    }

    // =============================================================
    // Uploads and alerts
    // =============================================================

    pub fn start_upload(&mut self, local_id: &str, file_name: &str) {
        self.uploads.start(local_id, file_name);
    }

    /// A staged file could not be read; nothing was emitted for it.
    pub fn upload_read_failed(&mut self, local_id: &str, file_name: &str) {
        self.uploads.fail(local_id);
        self.alerts.push(format!("Could not read {file_name}"));
    }

    /// An emit could not be delivered because the channel was down.
    pub fn emit_dropped(&mut self, event: &ClientEvent) {
        match event {
            ClientEvent::SendMessage { .. } => self.alerts.push("Message not sent: not connected".to_owned()),
            ClientEvent::UploadFile(upload) => {
                self.uploads.fail_by_name(&upload.file_name);
                self.alerts.push(format!("{} was not sent: not connected", upload.file_name));
            }
        }
    }

    pub fn dismiss_alert(&mut self, index: usize) {
        if index < self.alerts.len() {
            self.alerts.remove(index);
        }
    }

    fn push_live(&mut self, message: ChatMessage) {
        if self.history == HistoryState::Loading {
            self.buffered.push(message);
        } else {
            self.messages.push(message);
        }
    }

    fn upsert_user(&mut self, user: OnlineUser) {
        if let Some(existing) = self.online_users.iter_mut().find(|u| u.user_id == user.user_id) {
            *existing = user;
        } else {
            self.online_users.push(user);
        }
    }
}
