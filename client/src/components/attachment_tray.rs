//! Staged-file panel shown above the composer.
//!
//! SYSTEM CONTEXT
//! ==============
//! Lists the files picked for upload with their sizes. Individual files can
//! be removed, the whole selection discarded, or everything sent at once.
//! The panel renders only while the tray holds at least one file.

#[cfg(test)]
#[path = "attachment_tray_test.rs"]
mod attachment_tray_test;

use leptos::prelude::*;

use crate::state::attachments::{AttachmentTray, BrowserFile};
use crate::util::format::file_size;

/// One row's label, e.g. `"notes.txt (1.5 KB)"`.
pub fn attachment_row_label(name: &str, size_bytes: u64) -> String {
    format!("{name} ({})", file_size(size_bytes))
}

/// Header of the panel, e.g. `"Selected Files (2)"`.
pub fn tray_heading<H>(tray: &AttachmentTray<H>) -> String {
    format!("Selected Files ({})", tray.len())
}

#[component]
pub fn AttachmentTrayPanel(
    tray: RwSignal<AttachmentTray<BrowserFile>, LocalStorage>,
    #[prop(into)] disabled: Signal<bool>,
    on_upload: Callback<()>,
) -> impl IntoView {
    let rows = move || {
        tray.with(|t| {
            t.items()
                .iter()
                .map(|item| (item.local_id.clone(), attachment_row_label(&item.name, item.size_bytes)))
                .collect::<Vec<_>>()
        })
    };

    view! {
        <Show when=move || tray.with(AttachmentTray::is_open)>
            <div class="file-preview-container">
                <div class="file-preview-header">
                    <span>{move || tray.with(tray_heading)}</span>
                    <button class="link-button" type="button" on:click=move |_| tray.update(AttachmentTray::clear)>
                        "Clear All"
                    </button>
                </div>
                <ul class="file-preview-list">
                    <For
                        each=rows
                        key=|(id, _)| id.clone()
                        children=move |(id, label)| {
                            view! {
                                <li class="file-preview-item">
                                    <span>{label}</span>
                                    <button
                                        class="remove-file"
                                        type="button"
                                        on:click=move |_| {
                                            tray.update(|t| {
                                                t.remove(&id);
                                            });
                                        }
                                    >
                                        "×"
                                    </button>
                                </li>
                            }
                        }
                    />
                </ul>
                <button
                    class="upload-button"
                    type="button"
                    disabled=move || disabled.get()
                    on:click=move |_| on_upload.run(())
                >
                    {move || tray.with(AttachmentTray::upload_label)}
                </button>
            </div>
        </Show>
    }
}
