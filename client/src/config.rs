//! Build-time application configuration.
//!
//! SYSTEM CONTEXT
//! ==============
//! Values are baked in with `option_env!` when the WASM bundle is built, so a
//! deployment picks its backend with `GROUPCHAT_API_URL=... trunk build`.
//! The resolved [`AppConfig`] is provided through Leptos context by `App`.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

/// Hosted backend used when no URL was configured at build time.
pub const DEFAULT_BACKEND_URL: &str = "https://groupchat-with-payment.onrender.com";
pub const DEFAULT_APP_NAME: &str = "Group Chat App";

/// Resolved client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the HTTP API, without a trailing slash.
    pub api_url: String,
    /// Base URL of the real-time server, without a trailing slash.
    pub socket_url: String,
    pub app_name: String,
    pub app_version: String,
    /// Enables verbose console logging.
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    /// Configuration captured from the build environment.
    pub fn from_build_env() -> Self {
        Self::from_lookup(|key| match key {
            "GROUPCHAT_API_URL" => option_env!("GROUPCHAT_API_URL"),
            "GROUPCHAT_SOCKET_URL" => option_env!("GROUPCHAT_SOCKET_URL"),
            "GROUPCHAT_APP_NAME" => option_env!("GROUPCHAT_APP_NAME"),
            "GROUPCHAT_APP_VERSION" => option_env!("GROUPCHAT_APP_VERSION"),
            "GROUPCHAT_DEBUG" => option_env!("GROUPCHAT_DEBUG"),
            _ => None,
        })
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset. The socket URL falls back to the API URL.
    pub fn from_lookup<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
        let read = |key: &str| lookup(key).map(str::trim).filter(|v| !v.is_empty());

        let api_url = normalize_base_url(read("GROUPCHAT_API_URL").unwrap_or(DEFAULT_BACKEND_URL));
        let socket_url = read("GROUPCHAT_SOCKET_URL").map_or_else(|| api_url.clone(), normalize_base_url);
        let app_name = read("GROUPCHAT_APP_NAME").unwrap_or(DEFAULT_APP_NAME).to_owned();
        let app_version = read("GROUPCHAT_APP_VERSION")
            .unwrap_or(env!("CARGO_PKG_VERSION"))
            .to_owned();
        let debug = parse_flag(read("GROUPCHAT_DEBUG"), cfg!(debug_assertions));

        Self { api_url, socket_url, app_name, app_version, debug }
    }

    /// Absolute URL for an API path such as `/api/auth/me`.
    pub fn api_endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
