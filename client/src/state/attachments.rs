//! Staged attachments and in-flight uploads.
//!
//! SYSTEM CONTEXT
//! ==============
//! The chat page stages picked files in an [`AttachmentTray`] and, on send,
//! hands them off as `uploadFile` emits. Each emit becomes a pending entry in
//! [`UploadTracker`] until the server echoes the file back as a message or
//! reports `uploadError`.
//!
//! DESIGN
//! ======
//! The tray is generic over the file handle so browser code stores
//! `web_sys::File` while tests use plain values. The panel is open exactly
//! when the tray is non-empty.

#[cfg(test)]
#[path = "attachments_test.rs"]
mod attachments_test;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use wire::{ChatMessage, FileUpload, MessageBody};

/// File handle stored in the browser tray.
#[cfg(feature = "csr")]
pub type BrowserFile = web_sys::File;
#[cfg(not(feature = "csr"))]
pub type BrowserFile = ();

/// MIME type sent when the browser reports none.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// A picked file waiting to be sent or removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAttachment<H> {
    pub local_id: String,
    pub handle: H,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Selection metadata for one picked file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickedFile<H> {
    pub handle: H,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentTray<H> {
    items: Vec<PendingAttachment<H>>,
}

impl<H> Default for AttachmentTray<H> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<H> AttachmentTray<H> {
    /// Append picked files; returns how many were staged.
    pub fn add(&mut self, files: impl IntoIterator<Item = PickedFile<H>>) -> usize {
        let before = self.items.len();
        self.items.extend(files.into_iter().map(|file| PendingAttachment {
            local_id: uuid::Uuid::new_v4().to_string(),
            handle: file.handle,
            name: file.name,
            mime_type: file.mime_type,
            size_bytes: file.size_bytes,
        }));
        self.items.len() - before
    }

    /// Remove one staged file. Removing the last one closes the panel.
    pub fn remove(&mut self, local_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.local_id != local_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Hand every staged file off for upload, leaving the tray empty.
    pub fn take_all(&mut self) -> Vec<PendingAttachment<H>> {
        std::mem::take(&mut self.items)
    }

    pub fn items(&self) -> &[PendingAttachment<H>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_open(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|item| item.size_bytes).sum()
    }

    /// Label of the send button, e.g. `"Upload 2 Files"`.
    pub fn upload_label(&self) -> String {
        match self.items.len() {
            1 => "Upload 1 File".to_owned(),
            n => format!("Upload {n} Files"),
        }
    }
}

/// Build the `uploadFile` payload for a read file.
pub fn encode_upload(bytes: &[u8], file_name: &str, mime_type: &str) -> FileUpload {
    let file_type = if mime_type.trim().is_empty() { FALLBACK_MIME_TYPE } else { mime_type };
    FileUpload {
        file: STANDARD.encode(bytes),
        file_name: file_name.to_owned(),
        file_type: file_type.to_owned(),
    }
}

// =============================================================
// Upload tracking
// =============================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUpload {
    pub local_id: String,
    pub file_name: String,
}

/// Emitted uploads awaiting their echo.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadTracker {
    pending: Vec<PendingUpload>,
}

impl UploadTracker {
    pub fn start(&mut self, local_id: &str, file_name: &str) {
        self.pending.push(PendingUpload { local_id: local_id.to_owned(), file_name: file_name.to_owned() });
    }

    pub fn is_uploading(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending(&self) -> &[PendingUpload] {
        &self.pending
    }

    /// Complete the pending upload matched by an own-user file echo.
    ///
    /// An echo whose name matches nothing completes the oldest pending upload.
    pub fn complete_echo(&mut self, message: &ChatMessage, self_user_id: &str) -> bool {
        let MessageBody::File(file) = &message.body else {
            return false;
        };
        if !message.is_from(self_user_id) || self.pending.is_empty() {
            return false;
        }
        let idx = self.pending.iter().position(|p| p.file_name == file.file_name).unwrap_or(0);
        self.pending.remove(idx);
        true
    }

    /// Fail one upload, e.g. because the file could not be read.
    pub fn fail(&mut self, local_id: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.local_id != local_id);
        self.pending.len() != before
    }

    /// Fail the oldest pending upload of `file_name`.
    pub fn fail_by_name(&mut self, file_name: &str) -> bool {
        let Some(idx) = self.pending.iter().position(|p| p.file_name == file_name) else {
            return false;
        };
        self.pending.remove(idx);
        true
    }

    /// Fail everything still pending; returns how many were dropped.
    pub fn fail_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}
