//! OTP entry step shared by login and registration.
//!
//! SYSTEM CONTEXT
//! ==============
//! Rendered while the session machine is in `OtpPending`. Submits the code
//! to `/api/auth/verify-otp`, re-sends it through whichever endpoint started
//! the flow, or abandons the flow.

use leptos::prelude::*;

use crate::app::SessionContext;
use crate::state::session::{AuthState, OtpPurpose, ResendRequest};

#[component]
pub fn OtpForm(purpose: OtpPurpose) -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let auth = session.auth;
    let code = RwSignal::new(String::new());
    let busy = move || auth.with(AuthState::is_busy);
    let email = move || auth.with(|a| a.pending_email().unwrap_or_default().to_owned());

    let on_verify = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(Ok(request)) = auth.try_update(|a| a.submit_otp(&code.get_untracked())) else {
            return;
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            let result = session.api().verify_otp(&request).await;
            let tokens = session.tokens();
            auth.update(|a| a.otp_result(result, tokens.as_ref()));
        });
        #[cfg(not(feature = "csr"))]
        let _ = request;
    };

    let on_resend = move |_| {
        let Some(request) = auth.try_update(AuthState::request_resend).flatten() else {
            return;
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            let api = session.api();
            let result = match &request {
                ResendRequest::Login(body) => api.login(body).await,
                ResendRequest::Register(body) => api.register(body).await,
            };
            auth.update(|a| a.resend_result(result));
        });
        #[cfg(not(feature = "csr"))]
        let _ = request;
    };

    let on_back = move |_| {
        code.set(String::new());
        auth.update(AuthState::back_to_login);
    };

    let heading = match purpose {
        OtpPurpose::Login => "Verify Login",
        OtpPurpose::Register => "Verify Email",
    };

    view! {
        <form class="auth-form otp-form" on:submit=on_verify>
            <h3>{heading}</h3>
            <p class="otp-form__hint">"Enter the OTP sent to " <strong>{email}</strong></p>
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
            <div class="otp-form__actions">
                <button class="link-button" type="button" on:click=on_resend disabled=busy>
                    "Resend OTP"
                </button>
                <button class="link-button" type="button" on:click=on_back>
                    "Back"
                </button>
            </div>
        </form>
    }
}
