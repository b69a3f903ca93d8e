//! Shared auth UI helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route components apply identical redirect behavior: protected pages send
//! signed-out users to `/login`, and the pre-auth pages send signed-in users
//! on to `/dashboard`. Nothing redirects while the startup probe runs.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

use crate::state::session::AuthState;

pub const LOGIN_ROUTE: &str = "/login";
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Where a protected page should send the user, if anywhere.
pub fn unauth_redirect_target(state: &AuthState) -> Option<&'static str> {
    (!state.is_probing() && !state.is_authenticated()).then_some(LOGIN_ROUTE)
}

/// Where a pre-auth page should send the user, if anywhere.
pub fn authed_redirect_target(state: &AuthState) -> Option<&'static str> {
    state.is_authenticated().then_some(DASHBOARD_ROUTE)
}

/// Redirect to `/login` whenever the probe has finished and no session is present.
pub fn install_unauth_redirect<F>(auth: RwSignal<AuthState>, navigate: F)
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    Effect::new(move || {
        if let Some(target) = auth.with(unauth_redirect_target) {
            navigate(target, NavigateOptions::default());
        }
    });
}

/// Redirect to `/dashboard` as soon as a session exists.
pub fn install_authed_redirect<F>(auth: RwSignal<AuthState>, navigate: F)
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    Effect::new(move || {
        if let Some(target) = auth.with(authed_redirect_target) {
            navigate(target, NavigateOptions::default());
        }
    });
}
