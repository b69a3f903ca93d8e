//! Dashboard page: profile, group membership and payment history.
//!
//! SYSTEM CONTEXT
//! ==============
//! The authenticated landing route. It shows the signed-in user's profile
//! with inline name editing and picture upload, and either a link into the
//! group chat or the checkout flow that buys access. Signed-out visitors are
//! redirected to `/login`.
//!
//! DESIGN
//! ======
//! Membership is confirmed against `/api/payment/status` on mount and then
//! polled while the user is not a member, so a payment completed in another
//! tab unlocks the chat here too. A successful checkout marks the session
//! as a member directly; the page does not reload.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;

use crate::app::SessionContext;
use crate::components::message_item::DEFAULT_AVATAR;
use crate::components::notice_banner::NoticeBanner;
use crate::net::types::{PaymentRecord, UpdateProfileRequest};
use crate::state::session::{AuthState, Notice};
use crate::util::auth::install_unauth_redirect;
use crate::util::format::{amount, member_since};

const FLASH_CLEAR_MS: u32 = 3_000;
#[cfg_attr(not(feature = "csr"), allow(dead_code))]
const PAYMENT_POLL_SECS: u64 = 10;
pub const PAYMENT_SUCCESS_MESSAGE: &str = "Payment successful! You can now access the group chat.";

/// Validate an edited display name.
pub fn profile_update(name: &str) -> Result<UpdateProfileRequest, &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name is required");
    }
    Ok(UpdateProfileRequest { name: name.to_owned() })
}

/// One line of the payment history list.
pub fn payment_row_label(record: &PaymentRecord) -> String {
    let date = record
        .created_at
        .as_deref()
        .and_then(|raw| raw.split('T').next())
        .unwrap_or("");
    let mut label = format!("{} · {}", amount(record.amount, &record.currency), record.status);
    if !date.is_empty() {
        label.push_str(" · ");
        label.push_str(date);
    }
    label
}

/// Show `notice` and clear it after a short delay unless replaced.
fn show_flash(flash: RwSignal<Option<Notice>>, notice: Notice) {
    flash.set(Some(notice.clone()));
    #[cfg(feature = "csr")]
    leptos::task::spawn_local(async move {
        gloo_timers::future::TimeoutFuture::new(FLASH_CLEAR_MS).await;
        let _ = flash.try_update(|current| {
            if current.as_ref() == Some(&notice) {
                *current = None;
            }
        });
    });
    #[cfg(not(feature = "csr"))]
    let _ = FLASH_CLEAR_MS;
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let auth = session.auth;
    install_unauth_redirect(auth, use_navigate());

    let flash = RwSignal::new(None::<Notice>);
    let editing = RwSignal::new(false);
    let name_draft = RwSignal::new(String::new());
    let saving = RwSignal::new(false);
    let paying = RwSignal::new(false);
    let payments = RwSignal::new(Vec::<PaymentRecord>::new());
    let picture_input = NodeRef::<leptos::html::Input>::new();

    let current = move || auth.with(|a| a.session().cloned());
    let is_member = move || auth.with(|a| a.session().is_some_and(|s| s.is_group_member));

    // Error paths shared by every call on this page.
    let report = move |err: crate::net::api::ApiError, fallback: &str| {
        if !session.expire_on_unauthorized(&err) {
            show_flash(flash, Notice::Error(err.user_message(fallback)));
        }
    };

    #[cfg(feature = "csr")]
    {
        leptos::task::spawn_local(async move {
            match session.api().payment_history().await {
                Ok(resp) => {
                    let _ = payments.try_set(resp.payments);
                }
                Err(e) => leptos::logging::warn!("payment history unavailable: {e}"),
            }
        });

        let poll_alive = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
        let poll_alive_task = poll_alive.clone();
        leptos::task::spawn_local(async move {
            loop {
                if !poll_alive_task.load(std::sync::atomic::Ordering::Relaxed) {
                    break;
                }
                let member = auth
                    .try_with_untracked(|a| a.session().map(|s| s.is_group_member))
                    .flatten();
                match member {
                    None | Some(true) => break,
                    Some(false) => match session.api().payment_status().await {
                        Ok(status) if status.is_group_member => {
                            let _ = auth.try_update(AuthState::mark_group_member);
                            break;
                        }
                        Ok(_) => {}
                        Err(e) if e.is_unauthorized() => {
                            if poll_alive_task.load(std::sync::atomic::Ordering::Relaxed) {
                                session.expire_on_unauthorized(&e);
                            }
                            break;
                        }
                        Err(e) => leptos::logging::warn!("payment status check failed: {e}"),
                    },
                }
                gloo_timers::future::sleep(std::time::Duration::from_secs(PAYMENT_POLL_SECS)).await;
            }
        });
        on_cleanup(move || poll_alive.store(false, std::sync::atomic::Ordering::Relaxed));
    }
    #[cfg(not(feature = "csr"))]
    let _ = payments;

    let on_edit = move |_| {
        name_draft.set(auth.with_untracked(|a| a.session().map(|s| s.display_name.clone()).unwrap_or_default()));
        editing.set(true);
    };

    let on_save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        let request = match profile_update(&name_draft.get_untracked()) {
            Ok(request) => request,
            Err(msg) => {
                show_flash(flash, Notice::Error(msg.to_owned()));
                return;
            }
        };
        saving.set(true);
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            match session.api().update_profile(&request).await {
                Ok(resp) => {
                    auth.update(|a| a.update_session(resp.user));
                    editing.set(false);
                    let text = resp.message.unwrap_or_else(|| "Profile updated successfully!".to_owned());
                    show_flash(flash, Notice::Success(text));
                }
                Err(e) => report(e, "Failed to update profile"),
            }
            saving.set(false);
        });
        #[cfg(not(feature = "csr"))]
        let _ = (request, report);
    };

    let on_picture_change = move |_| {
        #[cfg(feature = "csr")]
        {
            let Some(input) = picture_input.get_untracked() else {
                return;
            };
            let file = input.files().and_then(|list| list.get(0));
            input.set_value("");
            let Some(file) = file else {
                return;
            };
            leptos::task::spawn_local(async move {
                match session.api().upload_profile_picture(&file).await {
                    Ok(resp) => {
                        auth.update(|a| a.set_profile_picture(&resp.profile_pic));
                        let text = resp
                            .message
                            .unwrap_or_else(|| "Profile picture updated successfully!".to_owned());
                        show_flash(flash, Notice::Success(text));
                    }
                    Err(e) => report(e, "Failed to upload profile picture"),
                }
            });
        }
    };

    let on_join = move |_| {
        if paying.get_untracked() {
            return;
        }
        let Some(user) = auth.with_untracked(|a| a.session().cloned()) else {
            return;
        };
        paying.set(true);
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            let order = match session.api().create_order().await {
                Ok(order) => order,
                Err(e) => {
                    report(e, "Failed to create payment order");
                    paying.set(false);
                    return;
                }
            };
            let options = crate::util::checkout::checkout_options(&order, &user.display_name, &user.email);
            let opened = crate::util::checkout::open_checkout(
                &options,
                move |outcome| match outcome {
                    Ok(verification) => leptos::task::spawn_local(async move {
                        match session.api().verify_payment(&verification).await {
                            Ok(_) => {
                                let _ = auth.try_update(AuthState::mark_group_member);
                                show_flash(flash, Notice::Success(PAYMENT_SUCCESS_MESSAGE.to_owned()));
                                if let Ok(resp) = session.api().payment_history().await {
                                    let _ = payments.try_set(resp.payments);
                                }
                            }
                            Err(e) => report(e, "Payment verification failed"),
                        }
                        let _ = paying.try_set(false);
                    }),
                    Err(e) => {
                        leptos::logging::warn!("unreadable checkout result: {e}");
                        show_flash(flash, Notice::Error("Payment verification failed".to_owned()));
                        let _ = paying.try_set(false);
                    }
                },
                move || {
                    show_flash(flash, Notice::Info("Payment cancelled".to_owned()));
                    let _ = paying.try_set(false);
                },
            );
            if let Err(e) = opened {
                leptos::logging::warn!("checkout unavailable: {e}");
                show_flash(flash, Notice::Error("Payment system is not available".to_owned()));
                paying.set(false);
            }
        });
        #[cfg(not(feature = "csr"))]
        let _ = user;
    };

    let on_logout = move |_| session.logout();

    view! {
        <div class="dashboard">
            <header class="dashboard__header">
                <h1>"Dashboard"</h1>
                <button class="logout-button" type="button" on:click=on_logout>
                    "Logout"
                </button>
            </header>
            <NoticeBanner notice=Signal::derive(move || flash.get())/>
            {move || {
                current()
                    .map(|user| {
                        let avatar = user.profile_picture.clone().unwrap_or_else(|| DEFAULT_AVATAR.to_owned());
                        let since = member_since(user.member_since());
                        let display_name = user.display_name.clone();
                        view! {
                            <section class="profile-card">
                                <div class="profile-card__avatar">
                                    <img src=avatar alt=user.display_name.clone() class="profile-picture"/>
                                    <label class="upload-picture">
                                        "Change Picture"
                                        <input
                                            type="file"
                                            accept="image/*"
                                            node_ref=picture_input
                                            on:change=on_picture_change
                                        />
                                    </label>
                                </div>
                                <Show
                                    when=move || editing.get()
                                    fallback=move || {
                                        view! {
                                            <div class="profile-card__info">
                                                <h2>{display_name.clone()}</h2>
                                                <button class="edit-button" type="button" on:click=on_edit>
                                                    "Edit Name"
                                                </button>
                                            </div>
                                        }
                                    }
                                >
                                    <form class="profile-card__edit" on:submit=on_save>
                                        <input
                                            class="auth-input"
                                            type="text"
                                            prop:value=move || name_draft.get()
                                            on:input=move |ev| name_draft.set(event_target_value(&ev))
                                        />
                                        <button class="save-button" type="submit" disabled=move || saving.get()>
                                            {move || if saving.get() { "Saving..." } else { "Save" }}
                                        </button>
                                        <button class="cancel-button" type="button" on:click=move |_| editing.set(false)>
                                            "Cancel"
                                        </button>
                                    </form>
                                </Show>
                                <p class="profile-card__email">{user.email}</p>
                                <p class="profile-card__since">"Member since " {since}</p>
                            </section>
                        }
                    })
            }}
            <section class="membership-card">
                <Show
                    when=is_member
                    fallback=move || {
                        view! {
                            <h3>"Join the Group Chat"</h3>
                            <p>"Get access to the members-only group chat for a one-time payment."</p>
                            <button class="pay-button" type="button" on:click=on_join disabled=move || paying.get()>
                                {move || if paying.get() { "Processing..." } else { "Join Group Chat" }}
                            </button>
                        }
                    }
                >
                    <h3>"Group Member ✓"</h3>
                    <p>"You have access to the group chat."</p>
                    <A href="/group-chat" attr:class="chat-link">"Open Group Chat"</A>
                </Show>
            </section>
            <Show when=move || payments.with(|p| !p.is_empty())>
                <section class="payment-history">
                    <h3>"Payment History"</h3>
                    <ul>
                        <For
                            each=move || payments.get()
                            key=|record| record.order_id.clone()
                            children=|record| view! { <li>{payment_row_label(&record)}</li> }
                        />
                    </ul>
                </section>
            </Show>
        </div>
    }
}
