//! # client
//!
//! Leptos + WASM single-page client for the group chat service: OTP login
//! and registration, a profile/payment dashboard, and a real-time group chat
//! over Socket.IO.
//!
//! Pure state and protocol logic lives in `state` and `net` and is tested
//! natively; everything touching the browser is gated behind the `csr`
//! feature.

pub mod app;
pub mod components;
pub mod config;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: install logging and mount [`app::App`] on `<body>`.
#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let config = config::AppConfig::from_build_env();
    let level = if config.debug { log::Level::Debug } else { log::Level::Warn };
    let _ = console_log::init_with_level(level);
    log::info!("{} v{} starting", config.app_name, config.app_version);
    leptos::mount::mount_to_body(app::App);
}
