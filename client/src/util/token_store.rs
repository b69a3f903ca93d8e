//! Persistence of the bearer credential token.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend hands out a token on OTP verification. It is kept in
//! `localStorage["token"]`; a `token` cookie set by the backend is accepted
//! as a fallback when local storage is empty. Everything that needs the token
//! receives a [`TokenStore`] instead of reaching into browser globals.

#[cfg(test)]
#[path = "token_store_test.rs"]
mod token_store_test;

use std::sync::{Arc, Mutex};

/// Storage key and cookie name of the credential token.
pub const TOKEN_KEY: &str = "token";

/// Read/write access to the persisted credential token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// Token store backed by browser local storage and cookies.
///
/// Without the `csr` feature every operation is a no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTokenStore;

impl TokenStore for BrowserTokenStore {
    fn load(&self) -> Option<String> {
        #[cfg(feature = "csr")]
        {
            let stored = local_storage()
                .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten())
                .filter(|t| !t.is_empty());
            stored.or_else(|| document_cookies().and_then(|raw| cookie_value(&raw, TOKEN_KEY)))
        }
        #[cfg(not(feature = "csr"))]
        {
            None
        }
    }

    fn save(&self, token: &str) {
        #[cfg(feature = "csr")]
        {
            if let Some(storage) = local_storage() {
                let _ = storage.set_item(TOKEN_KEY, token);
            }
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = token;
        }
    }

    fn clear(&self) {
        #[cfg(feature = "csr")]
        {
            use wasm_bindgen::JsCast;

            if let Some(storage) = local_storage() {
                let _ = storage.remove_item(TOKEN_KEY);
            }
            let html_doc = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok());
            if let Some(doc) = html_doc {
                let _ = doc.set_cookie(&expired_cookie(TOKEN_KEY));
            }
        }
    }
}

/// In-memory token store used by tests and non-browser hosts.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
    token: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        let store = Self::default();
        store.save(token);
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(token.to_owned());
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = None;
        }
    }
}

/// Extract a cookie value from a `document.cookie` style string.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` style assignment that expires `name` immediately.
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/")
}

#[cfg(feature = "csr")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

#[cfg(feature = "csr")]
fn document_cookies() -> Option<String> {
    use wasm_bindgen::JsCast;

    let doc = web_sys::window()?.document()?;
    doc.dyn_into::<web_sys::HtmlDocument>().ok()?.cookie().ok()
}
