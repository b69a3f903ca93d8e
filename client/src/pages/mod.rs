//! Route-level page modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each page owns one route: the pre-auth forms, the dashboard and the
//! group chat. Pages perform API calls and feed their results into the
//! shared session state machine.

pub mod dashboard;
pub mod forgot_password;
pub mod group_chat;
pub mod login;
pub mod register;
pub mod reset_password;
