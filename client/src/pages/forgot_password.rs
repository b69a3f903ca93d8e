//! Forgot-password page: request a reset OTP, then verify it.
//!
//! Once the OTP is accepted the session machine is in `PasswordReset` and
//! the user is moved on to `/reset-password` to choose a new password.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;

use crate::app::SessionContext;
use crate::components::notice_banner::NoticeBanner;
use crate::state::session::{AuthState, AuthStep};
use crate::util::auth::install_authed_redirect;

pub const RESET_PASSWORD_ROUTE: &str = "/reset-password";

#[component]
pub fn ForgotPasswordPage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let auth = session.auth;
    let navigate = use_navigate();
    install_authed_redirect(auth, navigate.clone());

    let in_reset_branch =
        auth.with_untracked(|a| matches!(a.step(), AuthStep::ForgotPassword | AuthStep::OtpPendingReset { .. }));
    if !in_reset_branch {
        auth.update(AuthState::begin_forgot_password);
    }

    Effect::new(move || {
        if auth.with(|a| matches!(a.step(), AuthStep::PasswordReset { .. })) {
            navigate(RESET_PASSWORD_ROUTE, NavigateOptions::default());
        }
    });

    let email = RwSignal::new(String::new());
    let code = RwSignal::new(String::new());
    let busy = move || auth.with(AuthState::is_busy);
    let awaiting_otp = move || auth.with(|a| matches!(a.step(), AuthStep::OtpPendingReset { .. }));

    let on_request = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(Ok(request)) = auth.try_update(|a| a.submit_forgot_password(&email.get_untracked())) else {
            return;
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            let result = session.api().forgot_password(&request).await;
            auth.update(|a| a.forgot_password_result(&request.email, result));
        });
        #[cfg(not(feature = "csr"))]
        let _ = request;
    };

    let on_verify = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(Ok(request)) = auth.try_update(|a| a.submit_reset_otp(&code.get_untracked())) else {
            return;
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            let result = session.api().verify_reset_otp(&request).await;
            auth.update(|a| a.reset_otp_result(result));
        });
        #[cfg(not(feature = "csr"))]
        let _ = request;
    };

    view! {
        <div class="auth-page">
            <div class="auth-card">
                <h1>"Reset Password"</h1>
                <NoticeBanner notice=Signal::derive(move || auth.with(|a| a.notice().cloned()))/>
                <Show
                    when=awaiting_otp
                    fallback=move || {
                        view! {
                            <form class="auth-form" on:submit=on_request>
                                <p>"Enter your email to receive a reset code."</p>
                                <input
                                    class="auth-input"
                                    type="email"
                                    placeholder="Email"
                                    prop:value=move || email.get()
                                    on:input=move |ev| email.set(event_target_value(&ev))
                                />
                                <button class="auth-button" type="submit" disabled=busy>
                                    {move || if busy() { "Sending..." } else { "Send OTP" }}
                                </button>
                            </form>
                        }
                    }
                >
                    <form class="auth-form" on:submit=on_verify>
                        <p>
                            "Enter the OTP sent to "
                            <strong>{move || auth.with(|a| a.pending_email().unwrap_or_default().to_owned())}</strong>
                        </p>
                        <input
                            class="auth-input auth-input--otp"
                            type="text"
                            inputmode="numeric"
                            maxlength="6"
                            placeholder="Enter 6-digit OTP"
                            prop:value=move || code.get()
                            on:input=move |ev| code.set(event_target_value(&ev))
                        />
                        <button class="auth-button" type="submit" disabled=busy>
                            {move || if busy() { "Verifying..." } else { "Verify OTP" }}
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
