//! Utility helpers shared across client UI modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser/environment concerns from page and component
//! logic to improve reuse and testability.

pub mod auth;
pub mod checkout;
#[cfg(feature = "csr")]
pub mod files;
pub mod format;
pub mod token_store;
