//! Root application component with routing and context providers.

use std::sync::Arc;

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Redirect, Route, Router, Routes},
};

use crate::config::AppConfig;
use crate::net::api::{ApiClient, ApiError};
use crate::pages::{
    dashboard::DashboardPage, forgot_password::ForgotPasswordPage, group_chat::GroupChatPage, login::LoginPage,
    register::RegisterPage, reset_password::ResetPasswordPage,
};
use crate::state::session::AuthState;
use crate::util::auth::{DASHBOARD_ROUTE, LOGIN_ROUTE};
use crate::util::token_store::{BrowserTokenStore, TokenStore};

/// Session context shared by every page: the auth state machine plus the
/// API client bound to the same token store.
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub auth: RwSignal<AuthState>,
    api: StoredValue<ApiClient>,
}

impl SessionContext {
    pub fn new(auth: RwSignal<AuthState>, api: ApiClient) -> Self {
        Self { auth, api: StoredValue::new(api) }
    }

    pub fn api(&self) -> ApiClient {
        self.api.get_value()
    }

    pub fn tokens(&self) -> Arc<dyn TokenStore> {
        self.api.with_value(|api| api.tokens().clone())
    }

    /// End the session when `err` is an authorization failure.
    ///
    /// Returns `true` if the session was ended.
    pub fn expire_on_unauthorized(&self, err: &ApiError) -> bool {
        if !err.is_unauthorized() {
            return false;
        }
        let tokens = self.tokens();
        self.auth.update(|a| a.session_expired(tokens.as_ref()));
        true
    }

    /// Best-effort backend logout; the local session ends regardless.
    pub fn logout(&self) {
        let ctx = *self;
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            let result = ctx.api().logout().await;
            if let Err(e) = &result {
                leptos::logging::warn!("logout request failed: {e}");
            }
            let tokens = ctx.tokens();
            ctx.auth.update(|a| a.logout(result, tokens.as_ref()));
        });
        #[cfg(not(feature = "csr"))]
        {
            let tokens = ctx.tokens();
            ctx.auth.update(|a| {
                a.logout(Err(ApiError::Network("not available outside the browser".to_owned())), tokens.as_ref());
            });
        }
    }
}

/// Root application component.
///
/// Resolves configuration, runs the startup token probe and sets up
/// client-side routing.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let config = AppConfig::from_build_env();
    let tokens: Arc<dyn TokenStore> = Arc::new(BrowserTokenStore);
    let api = ApiClient::new(config.api_url.clone(), tokens.clone());

    let mut initial = AuthState::new();
    let needs_probe = initial.begin_probe(tokens.as_ref());
    let auth = RwSignal::new(initial);
    let session = SessionContext::new(auth, api);

    provide_context(config.clone());
    provide_context(session);

    #[cfg(feature = "csr")]
    if needs_probe {
        leptos::task::spawn_local(async move {
            let result = session.api().me().await.map(|resp| resp.user);
            if let Err(e) = &result {
                leptos::logging::warn!("stored session rejected: {e}");
            }
            let tokens = session.tokens();
            auth.update(|a| a.finish_probe(result, tokens.as_ref()));
        });
    }
    #[cfg(not(feature = "csr"))]
    let _ = needs_probe;

    view! {
        <Title text=config.app_name.clone()/>

        <Show
            when=move || !auth.with(AuthState::is_probing)
            fallback=|| view! { <div class="loading-screen">"Loading..."</div> }
        >
            <Router>
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=StaticSegment("login") view=LoginPage/>
                    <Route path=StaticSegment("register") view=RegisterPage/>
                    <Route path=StaticSegment("forgot-password") view=ForgotPasswordPage/>
                    <Route path=StaticSegment("reset-password") view=ResetPasswordPage/>
                    <Route path=StaticSegment("dashboard") view=DashboardPage/>
                    <Route path=StaticSegment("group-chat") view=GroupChatPage/>
                    <Route path=StaticSegment("") view=RootRedirect/>
                </Routes>
            </Router>
        </Show>
    }
}

/// `/` lands on the dashboard when signed in, otherwise on login.
#[component]
fn RootRedirect() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let target = if session.auth.with_untracked(AuthState::is_authenticated) {
        DASHBOARD_ROUTE
    } else {
        LOGIN_ROUTE
    };
    view! { <Redirect path=target/> }
}
