//! Group chat page for paying members.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mounting the page checks membership, loads message history over HTTP and
//! opens the realtime channel. The page owns the channel: leaving the route
//! closes it and stops any reconnect attempt.
//!
//! DESIGN
//! ======
//! `ChatState` is page-scoped and provided as context so child components
//! read the same signal the socket task writes. Staged files hold browser
//! `File` handles and live in a thread-local signal.

#[cfg(test)]
#[path = "group_chat_test.rs"]
mod group_chat_test;

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;

use crate::app::SessionContext;
use crate::components::attachment_tray::AttachmentTrayPanel;
use crate::components::message_item::MessageItem;
use crate::components::online_users_panel::OnlineUsersPanel;
use crate::config::AppConfig;
use crate::net::socket_client::SocketHandle;
use crate::state::attachments::{AttachmentTray, BrowserFile};
use crate::state::chat::{ChatAccess, ChatState, ConnectionStatus, HistoryState, outgoing_text, plan_connection};
use crate::util::auth::install_unauth_redirect;

pub fn connection_badge(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Connected => "🟢 Online",
        ConnectionStatus::Connecting => "🟡 Connecting...",
        ConnectionStatus::Disconnected => "🔴 Offline",
    }
}

/// Progress line shown while uploads await their echo.
pub fn upload_progress_label(pending: usize) -> Option<String> {
    match pending {
        0 => None,
        1 => Some("Uploading 1 file...".to_owned()),
        n => Some(format!("Uploading {n} files...")),
    }
}

#[component]
pub fn GroupChatPage() -> impl IntoView {
    let session = expect_context::<SessionContext>();
    let config = expect_context::<AppConfig>();
    let auth = session.auth;
    install_unauth_redirect(auth, use_navigate());

    let chat = RwSignal::new(ChatState::default());
    provide_context(chat);
    let tray = RwSignal::new_local(AttachmentTray::<BrowserFile>::default());
    let socket = StoredValue::new_local(None::<SocketHandle>);

    let tokens = session.tokens();
    let access = auth.with_untracked(|a| plan_connection(a.session(), tokens.load()));
    let self_user_id = auth.with_untracked(|a| a.session().map(|s| s.user_id.clone()).unwrap_or_default());

    if let ChatAccess::Open { auth: connect_auth } = access.clone() {
        chat.update(ChatState::begin_history);

        #[cfg(feature = "csr")]
        {
            leptos::task::spawn_local(async move {
                match session.api().chat_messages().await {
                    Ok(history) => {
                        let _ = chat.try_update(|c| c.seed_history(history));
                    }
                    Err(e) => {
                        leptos::logging::warn!("chat history failed: {e}");
                        let message = e.user_message("Failed to load messages");
                        if chat.try_update(|c| c.history_failed(message)).is_some() {
                            session.expire_on_unauthorized(&e);
                        }
                    }
                }
            });
            let handle = crate::net::socket_client::spawn_socket_client(
                &config.socket_url,
                connect_auth,
                self_user_id.clone(),
                chat,
            );
            socket.set_value(Some(handle));
        }
        #[cfg(not(feature = "csr"))]
        let _ = (connect_auth, &config);
    }

    on_cleanup(move || {
        let _ = socket.try_with_value(|handle| {
            if let Some(handle) = handle {
                handle.close();
            }
        });
    });

    match access {
        ChatAccess::Open { .. } => {
            view! { <ChatRoom chat=chat tray=tray socket=socket self_user_id=self_user_id/> }.into_any()
        }
        ChatAccess::NotMember => view! {
            <div class="chat-locked">
                <h2>"Members Only"</h2>
                <p>"You need to join the group to access the chat."</p>
                <A href="/dashboard">"Back to Dashboard"</A>
            </div>
        }
        .into_any(),
        ChatAccess::SignedOut => view! { <div class="loading-screen">"Redirecting..."</div> }.into_any(),
    }
}

#[component]
fn ChatRoom(
    chat: RwSignal<ChatState>,
    tray: RwSignal<AttachmentTray<BrowserFile>, LocalStorage>,
    socket: StoredValue<Option<SocketHandle>, LocalStorage>,
    self_user_id: String,
) -> impl IntoView {
    let draft = RwSignal::new(String::new());
    let file_input = NodeRef::<leptos::html::Input>::new();
    let message_list = NodeRef::<leptos::html::Div>::new();

    // Keep the newest message in view.
    Effect::new(move || {
        let _ = chat.with(|c| c.messages.len());
        #[cfg(feature = "csr")]
        if let Some(list) = message_list.get() {
            list.set_scroll_top(list.scroll_height());
        }
    });

    let on_send = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let status = chat.with_untracked(|c| c.connection);
        let Some(event) = outgoing_text(&draft.get_untracked(), status) else {
            return;
        };
        draft.set(String::new());
        #[cfg(feature = "csr")]
        socket.with_value(|handle| {
            if let Some(handle) = handle {
                crate::net::socket_client::send_event(handle, chat, event);
            }
        });
        #[cfg(not(feature = "csr"))]
        let _ = (event, socket);
    };

    let on_files_picked = move |_| {
        #[cfg(feature = "csr")]
        if let Some(input) = file_input.get_untracked() {
            let picked = crate::util::files::take_picked_files(&input);
            tray.update(|t| {
                t.add(picked);
            });
        }
    };

    let on_upload = Callback::new(move |()| {
        if !chat.with_untracked(ChatState::can_send) {
            return;
        }
        let staged = tray.try_update(AttachmentTray::take_all).unwrap_or_default();
        if staged.is_empty() {
            return;
        }
        #[cfg(feature = "csr")]
        socket.with_value(|handle| {
            if let Some(handle) = handle {
                crate::net::socket_client::send_attachments(handle, chat, staged);
            }
        });
        #[cfg(not(feature = "csr"))]
        let _ = staged;
    });

    let can_send = move || chat.with(ChatState::can_send);
    let upload_disabled = Signal::derive(move || !chat.with(ChatState::can_send) || chat.with(ChatState::is_uploading));

    view! {
        <div class="chat-page">
            <header class="chat-header">
                <A href="/dashboard" attr:class="back-link">"← Back to Dashboard"</A>
                <h1>"Group Chat"</h1>
                <span class="connection-badge">{move || chat.with(|c| connection_badge(c.connection))}</span>
            </header>
            {move || {
                chat.with(|c| c.connect_error.clone())
                    .map(|reason| view! { <div class="message message--error">"Connection refused: " {reason}</div> })
            }}
            <ul class="chat-alerts">
                {move || {
                    chat.with(|c| c.alerts.clone())
                        .into_iter()
                        .enumerate()
                        .map(|(index, alert)| {
                            view! {
                                <li class="chat-alert">
                                    <span>{alert}</span>
                                    <button
                                        class="link-button"
                                        type="button"
                                        on:click=move |_| chat.update(|c| c.dismiss_alert(index))
                                    >
                                        "Dismiss"
                                    </button>
                                </li>
                            }
                        })
                        .collect_view()
                }}
            </ul>
            <div class="chat-body">
                <div class="messages" node_ref=message_list>
                    {move || {
                        chat.with(|c| match &c.history {
                            HistoryState::Loading => Some("Loading messages...".to_owned()),
                            HistoryState::Failed(reason) => Some(reason.clone()),
                            HistoryState::Idle | HistoryState::Loaded => None,
                        })
                            .map(|text| view! { <p class="history-status">{text}</p> })
                    }}
                    {move || {
                        let own_id = self_user_id.clone();
                        chat.with(|c| {
                            c.messages
                                .iter()
                                .cloned()
                                .map(|message| view! { <MessageItem message=message self_user_id=own_id.clone()/> })
                                .collect_view()
                        })
                    }}
                </div>
                <OnlineUsersPanel users=Signal::derive(move || chat.with(|c| c.online_users.clone()))/>
            </div>
            <AttachmentTrayPanel tray=tray disabled=upload_disabled on_upload=on_upload/>
            {move || {
                chat.with(|c| upload_progress_label(c.uploads.pending().len()))
                    .map(|text| view! { <p class="upload-progress">{text}</p> })
            }}
            <form class="chat-composer" on:submit=on_send>
                <label class="attach-button" title="Attach files">
                    "📎"
                    <input type="file" multiple=true node_ref=file_input on:change=on_files_picked/>
                </label>
                <input
                    class="chat-input"
                    type="text"
                    placeholder=move || if can_send() { "Type a message..." } else { "Connecting..." }
                    prop:value=move || draft.get()
                    on:input=move |ev| draft.set(event_target_value(&ev))
                    disabled=move || !can_send()
                />
                <button class="send-button" type="submit" disabled=move || !can_send()>
                    "Send"
                </button>
            </form>
        </div>
    }
}
