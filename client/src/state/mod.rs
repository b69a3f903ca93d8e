//! Client-side application state.
//!
//! SYSTEM CONTEXT
//! ==============
//! Plain structs held in `RwSignal`s and provided through Leptos context.
//! All transitions are synchronous methods so they test without a browser.

pub mod attachments;
pub mod chat;
pub mod session;
