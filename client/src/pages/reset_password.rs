//! Reset-password page: choose a new password for a verified reset OTP.
//!
//! Reached from the forgot-password flow or directly through a
//! `/reset-password?email=..&otp=..` link.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::components::A;
use leptos_router::hooks::{use_navigate, use_query_map};

use crate::app::SessionContext;
use crate::components::notice_banner::NoticeBanner;
use crate::state::session::{AuthState, AuthStep};
use crate::util::auth::{LOGIN_ROUTE, install_authed_redirect};

#[component]
pub fn ResetPasswordPage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let auth = session.auth;
    let navigate = use_navigate();
    install_authed_redirect(auth, navigate.clone());

    let query = use_query_map();
    let (link_email, link_otp) =
        query.with_untracked(|q| (q.get("email").unwrap_or_default(), q.get("otp").unwrap_or_default()));
    if !link_email.is_empty() && !link_otp.is_empty() {
        auth.update(|a| a.enter_reset_link(&link_email, &link_otp));
    }

    let done = RwSignal::new(false);
    Effect::new(move || {
        if done.get() {
            navigate(LOGIN_ROUTE, NavigateOptions::default());
        }
    });

    let password = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let busy = move || auth.with(AuthState::is_busy);
    let has_reset = move || auth.with(|a| matches!(a.step(), AuthStep::PasswordReset { .. }));

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(Ok(request)) =
            auth.try_update(|a| a.submit_new_password(&password.get_untracked(), &confirm.get_untracked()))
        else {
            return;
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            let result = session.api().reset_password(&request).await;
            let succeeded = result.is_ok();
            auth.update(|a| a.reset_password_result(result));
            if succeeded {
                done.set(true);
            }
        });
        #[cfg(not(feature = "csr"))]
        let _ = (request, done);
    };

    view! {
        <div class="auth-page">
            <div class="auth-card">
                <h1>"Set New Password"</h1>
                <NoticeBanner notice=Signal::derive(move || auth.with(|a| a.notice().cloned()))/>
                <Show
                    when=has_reset
                    fallback=move || {
                        (!done.get()).then(|| {
                            view! {
                                <p class="auth-links">
                                    "This reset link is invalid or has expired. "
                                    <A href="/forgot-password">"Request a new one"</A>
                                </p>
                            }
                        })
                    }
                >
                    <form class="auth-form" on:submit=on_submit>
                        <input
                            class="auth-input"
                            type="password"
                            placeholder="New Password"
                            prop:value=move || password.get()
                            on:input=move |ev| password.set(event_target_value(&ev))
                        />
                        <input
                            class="auth-input"
                            type="password"
                            placeholder="Confirm New Password"
                            prop:value=move || confirm.get()
                            on:input=move |ev| confirm.set(event_target_value(&ev))
                        />
                        <button class="auth-button" type="submit" disabled=busy>
                            {move || if busy() { "Resetting..." } else { "Reset Password" }}
                        </button>
                    </form>
                </Show>
                <p class="auth-links">
                    <A href="/login">"Back to Login"</A>
                </p>
            </div>
        </div>
    }
}
