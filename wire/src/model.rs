//! Domain DTOs exchanged with the backend over HTTP and the chat channel.
//!
//! DESIGN
//! ======
//! Backend payloads are camelCase JSON with Mongo-style `_id` keys, and chat
//! messages arrive in several loose shapes (`message` is a string for text and
//! an object for files; system notices are synthesized locally). Chat messages
//! are therefore parsed by hand into [`MessageBody`] once, so render code never
//! inspects raw payload shape.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An account as returned by `/api/auth/me`, `/api/auth/verify-otp` and the
/// profile endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend user identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login email address.
    #[serde(default)]
    pub email: String,
    /// Profile picture URL, if one was uploaded.
    #[serde(default)]
    pub profile_pic: Option<String>,
    /// Whether the account has paid for group chat access.
    #[serde(default)]
    pub is_group_member: bool,
    /// ISO 8601 creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// Calendar date the account was created, when the backend sent a parseable timestamp.
    #[must_use]
    pub fn member_since(&self) -> Option<NaiveDate> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.date_naive())
    }
}

/// A user currently connected to the chat channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUser {
    #[serde(rename = "userId", alias = "_id", alias = "id")]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "profilePic", default)]
    pub avatar: Option<String>,
}

/// A file stored by the backend and referenced from a chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRef {
    pub file_url: String,
    pub file_name: String,
    pub mime_type: String,
}

/// How a [`FileRef`] is presented in the message list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileDisplay {
    /// `image/*`: rendered inline.
    Image,
    /// `video/*`: rendered with an inline player.
    Video,
    /// Anything else: rendered as a download link.
    Download,
}

impl FileRef {
    /// Pick the presentation from the MIME type prefix.
    #[must_use]
    pub fn display(&self) -> FileDisplay {
        if self.mime_type.starts_with("image/") {
            FileDisplay::Image
        } else if self.mime_type.starts_with("video/") {
            FileDisplay::Video
        } else {
            FileDisplay::Download
        }
    }
}

/// Message payload variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    File(FileRef),
    /// Pre-rendered notice such as `"Ann joined the chat"`.
    System(String),
}

/// A single entry of the chat message list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    /// Server-assigned id; absent for locally synthesized notices.
    pub id: Option<String>,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub body: MessageBody,
}

impl ChatMessage {
    /// Build a locally synthesized system notice.
    #[must_use]
    pub fn system(text: impl Into<String>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            id: None,
            sender_id: String::new(),
            sender_name: String::new(),
            sender_avatar: None,
            timestamp,
            body: MessageBody::System(text.into()),
        }
    }

    /// Convert a backend message payload (history row or `newMessage` event).
    ///
    /// Returns `None` when the payload carries nothing renderable.
    #[must_use]
    pub fn from_wire(data: &Value) -> Option<Self> {
        let id = pick_str(data, &["_id", "id"]).map(str::to_owned);
        let sender_id = pick_str(data, &["userId", "senderId", "user_id"])
            .unwrap_or("unknown")
            .to_owned();
        let sender_name = pick_str(data, &["name", "senderName", "userName"])
            .unwrap_or("Unknown")
            .to_owned();
        let sender_avatar = pick_str(data, &["profilePic", "avatar"])
            .filter(|url| !url.is_empty())
            .map(str::to_owned);
        let timestamp = data.get("timestamp").and_then(parse_timestamp);

        let body = if data.get("type").and_then(Value::as_str) == Some("system") {
            MessageBody::System(pick_str(data, &["message", "content"])?.to_owned())
        } else {
            let payload = data.get("message").or_else(|| data.get("content"))?;
            match payload {
                Value::String(text) => MessageBody::Text(text.clone()),
                Value::Object(_) => MessageBody::File(parse_file_ref(payload)?),
                _ => return None,
            }
        };

        Some(Self { id, sender_id, sender_name, sender_avatar, timestamp, body })
    }

    /// Whether this message was sent by `user_id`.
    #[must_use]
    pub fn is_from(&self, user_id: &str) -> bool {
        !matches!(self.body, MessageBody::System(_)) && self.sender_id == user_id
    }
}

fn parse_file_ref(data: &Value) -> Option<FileRef> {
    let file_url = pick_str(data, &["fileUrl", "url"])?.to_owned();
    let file_name = pick_str(data, &["fileName", "name"])
        .map(str::to_owned)
        .unwrap_or_else(|| file_name_from_url(&file_url));
    let mime_type = pick_str(data, &["fileType", "mimeType"])
        .unwrap_or("application/octet-stream")
        .to_owned();
    Some(FileRef { file_url, file_name, mime_type })
}

fn file_name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("file")
        .to_owned()
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        Value::Number(number) => number.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

pub(crate) fn pick_str<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a str> {
    for key in keys {
        if let Some(value) = data.get(key).and_then(Value::as_str) {
            return Some(value);
        }
    }
    None
}
