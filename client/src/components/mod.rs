//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render auth forms and chat surfaces while reading/writing
//! shared state from Leptos context providers.

pub mod attachment_tray;
pub mod message_item;
pub mod notice_banner;
pub mod online_users_panel;
pub mod otp_form;
