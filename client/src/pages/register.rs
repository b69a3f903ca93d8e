//! Registration page: account details, then the emailed OTP.

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;

use crate::app::SessionContext;
use crate::components::notice_banner::NoticeBanner;
use crate::components::otp_form::OtpForm;
use crate::state::session::{AuthState, AuthStep, OtpPurpose};
use crate::util::auth::install_authed_redirect;

#[component]
pub fn RegisterPage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let auth = session.auth;
    install_authed_redirect(auth, use_navigate());

    let stale = auth.with_untracked(|a| {
        !matches!(
            a.step(),
            AuthStep::Anonymous
                | AuthStep::Authenticated(_)
                | AuthStep::CredentialsSubmitted { purpose: OtpPurpose::Register, .. }
                | AuthStep::OtpPending { purpose: OtpPurpose::Register, .. }
        )
    });
    if stale {
        auth.update(AuthState::back_to_login);
    }

    let name = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let busy = move || auth.with(AuthState::is_busy);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(Ok(request)) = auth.try_update(|a| {
            a.submit_registration(
                &name.get_untracked(),
                &email.get_untracked(),
                &password.get_untracked(),
                &confirm.get_untracked(),
            )
        }) else {
            return;
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            let result = session.api().register(&request).await;
            auth.update(|a| a.credentials_result(result));
        });
        #[cfg(not(feature = "csr"))]
        let _ = request;
    };

    view! {
        <div class="auth-page">
            <div class="auth-card">
                <h1>"Group Chat"</h1>
                <NoticeBanner notice=Signal::derive(move || auth.with(|a| a.notice().cloned()))/>
                <Show
                    when=move || auth.with(|a| a.awaiting_otp(OtpPurpose::Register))
                    fallback=move || {
                        view! {
                            <form class="auth-form" on:submit=on_submit>
                                <h2>"Register"</h2>
                                <input
                                    class="auth-input"
                                    type="text"
                                    placeholder="Full Name"
                                    prop:value=move || name.get()
                                    on:input=move |ev| name.set(event_target_value(&ev))
                                />
                                <input
                                    class="auth-input"
                                    type="email"
                                    placeholder="Email"
                                    prop:value=move || email.get()
                                    on:input=move |ev| email.set(event_target_value(&ev))
                                />
                                <input
                                    class="auth-input"
                                    type="password"
                                    placeholder="Password"
                                    prop:value=move || password.get()
                                    on:input=move |ev| password.set(event_target_value(&ev))
                                />
                                <input
                                    class="auth-input"
                                    type="password"
                                    placeholder="Confirm Password"
                                    prop:value=move || confirm.get()
                                    on:input=move |ev| confirm.set(event_target_value(&ev))
                                />
                                <button class="auth-button" type="submit" disabled=busy>
                                    {move || if busy() { "Sending OTP..." } else { "Register" }}
                                </button>
                                <p class="auth-links">
                                    "Already have an account? " <A href="/login">"Login"</A>
                                </p>
                            </form>
                        }
                    }
                >
                    <OtpForm purpose=OtpPurpose::Register/>
                </Show>
            </div>
        </div>
    }
}
