//! Browser file-picker helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Bridges `<input type="file">` selections into [`PickedFile`] values for
//! the attachment tray and reads `File` contents for upload.

use crate::state::attachments::PickedFile;

/// Drain the input's current selection and reset it so the same file can
/// be picked again.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn take_picked_files(input: &web_sys::HtmlInputElement) -> Vec<PickedFile<web_sys::File>> {
    let mut picked = Vec::new();
    if let Some(list) = input.files() {
        for idx in 0..list.length() {
            if let Some(file) = list.get(idx) {
                picked.push(PickedFile {
                    name: file.name(),
                    mime_type: file.type_(),
                    size_bytes: file.size().max(0.0) as u64,
                    handle: file,
                });
            }
        }
    }
    input.set_value("");
    picked
}

/// Read a file's full contents.
///
/// # Errors
///
/// Returns the browser's error text when the read is rejected.
pub async fn read_bytes(file: &web_sys::File) -> Result<Vec<u8>, String> {
    let buffer = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("{e:?}"))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}
