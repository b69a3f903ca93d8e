//! Status line for the current auth notice or a page-local notice.

use leptos::prelude::*;

use crate::state::session::Notice;

/// CSS modifier for a notice.
pub fn notice_class(notice: &Notice) -> &'static str {
    match notice {
        Notice::Info(_) => "message message--info",
        Notice::Success(_) => "message message--success",
        Notice::Error(_) => "message message--error",
    }
}

#[component]
pub fn NoticeBanner(#[prop(into)] notice: Signal<Option<Notice>>) -> impl IntoView {
    move || {
        notice.get().map(|n| {
            view! { <div class=notice_class(&n) role="status">{n.text().to_owned()}</div> }
        })
    }
}
