//! Sidebar roster of users connected to the chat channel.

#[cfg(test)]
#[path = "online_users_panel_test.rs"]
mod online_users_panel_test;

use leptos::prelude::*;
use wire::OnlineUser;

use super::message_item::DEFAULT_AVATAR;

pub fn roster_heading(count: usize) -> String {
    format!("Online Users ({count})")
}

#[component]
pub fn OnlineUsersPanel(#[prop(into)] users: Signal<Vec<OnlineUser>>) -> impl IntoView {
    view! {
        <aside class="online-users">
            <h3>{move || users.with(|u| roster_heading(u.len()))}</h3>
            <ul class="online-users__list">
                <For
                    each=move || users.get()
                    key=|user| user.user_id.clone()
                    children=|user| {
                        let avatar = user.avatar.clone().unwrap_or_else(|| DEFAULT_AVATAR.to_owned());
                        view! {
                            <li class="online-user">
                                <img src=avatar alt=user.name.clone() class="user-avatar"/>
                                <span>{user.name.clone()}</span>
                                <span class="online-indicator"></span>
                            </li>
                        }
                    }
                />
            </ul>
        </aside>
    }
}
