//! One entry of the chat message list.
//!
//! Render contract: text shows sender and body; files render inline as an
//! image or video player by MIME prefix, anything else as a download link;
//! system notices are centred without sender chrome.

#[cfg(test)]
#[path = "message_item_test.rs"]
mod message_item_test;

use leptos::prelude::*;
use wire::{ChatMessage, FileDisplay, FileRef, MessageBody};

use crate::util::format::local_clock_time;

pub const DEFAULT_AVATAR: &str = "/default-avatar.png";

/// Row class for a non-system message.
pub fn message_class(message: &ChatMessage, self_user_id: &str) -> &'static str {
    if message.is_from(self_user_id) { "message message--own" } else { "message" }
}

/// Download link label for a file attachment.
pub fn download_label(file: &FileRef) -> String {
    format!("📎 {}", file.file_name)
}

#[component]
pub fn MessageItem(message: ChatMessage, #[prop(into)] self_user_id: String) -> impl IntoView {
    let body = match &message.body {
        MessageBody::System(text) => {
            return view! {
                <div class="system-message">
                    <span>{text.clone()}</span>
                </div>
            }
            .into_any();
        }
        MessageBody::Text(text) => view! { <p>{text.clone()}</p> }.into_any(),
        MessageBody::File(file) => render_file(file),
    };

    let class = message_class(&message, &self_user_id);
    let avatar = message.sender_avatar.clone().unwrap_or_else(|| DEFAULT_AVATAR.to_owned());
    let time = local_clock_time(message.timestamp);

    view! {
        <div class=class>
            <div class="message__header">
                <img src=avatar alt=message.sender_name.clone() class="user-avatar"/>
                <span class="message__name">{message.sender_name.clone()}</span>
                <span class="message__time">{time}</span>
            </div>
            <div class="message__content">{body}</div>
        </div>
    }
    .into_any()
}

fn render_file(file: &FileRef) -> AnyView {
    let url = file.file_url.clone();
    match file.display() {
        FileDisplay::Image => view! {
            <div class="file-message">
                <img src=url alt=file.file_name.clone() class="file-preview"/>
            </div>
        }
        .into_any(),
        FileDisplay::Video => view! {
            <div class="file-message">
                <video src=url controls=true class="file-preview"></video>
            </div>
        }
        .into_any(),
        FileDisplay::Download => view! {
            <div class="file-message file-attachment">
                <a href=url target="_blank" rel="noopener noreferrer">{download_label(file)}</a>
            </div>
        }
        .into_any(),
    }
}
