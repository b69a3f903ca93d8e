use super::*;

fn picked(name: &str, size: u64) -> PickedFile<&'static str> {
    PickedFile { handle: "h", name: name.to_owned(), mime_type: "text/plain".to_owned(), size_bytes: size }
}

fn own_file_message(user_id: &str, file_name: &str) -> ChatMessage {
    ChatMessage::from_wire(&serde_json::json!({
        "userId": user_id,
        "name": "Ann",
        "message": {"fileUrl": format!("https://cdn/{file_name}"), "fileName": file_name, "fileType": "text/plain"}
    }))
    .expect("file message fixture")
}

// =============================================================
// AttachmentTray
// =============================================================

#[test]
fn removing_one_of_two_keeps_panel_open_and_last_closes_it() {
    let mut tray = AttachmentTray::default();
    assert_eq!(tray.add([picked("a.txt", 10), picked("b.txt", 20)]), 2);
    assert!(tray.is_open());

    let first = tray.items()[0].local_id.clone();
    assert!(tray.remove(&first));
    assert_eq!(tray.len(), 1);
    assert!(tray.is_open());

    let last = tray.items()[0].local_id.clone();
    assert!(tray.remove(&last));
    assert!(tray.is_empty());
    assert!(!tray.is_open());
}

#[test]
fn local_ids_are_unique_even_for_identical_files() {
    let mut tray = AttachmentTray::default();
    tray.add([picked("a.txt", 10), picked("a.txt", 10)]);
    assert_ne!(tray.items()[0].local_id, tray.items()[1].local_id);
}

#[test]
fn remove_unknown_id_is_noop() {
    let mut tray = AttachmentTray::default();
    tray.add([picked("a.txt", 10)]);
    assert!(!tray.remove("missing"));
    assert_eq!(tray.len(), 1);
}

#[test]
fn take_all_empties_and_closes_tray() {
    let mut tray = AttachmentTray::default();
    tray.add([picked("a.txt", 10), picked("b.txt", 20)]);
    assert_eq!(tray.total_size(), 30);
    assert_eq!(tray.upload_label(), "Upload 2 Files");

    let taken = tray.take_all();
    assert_eq!(taken.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(), ["a.txt", "b.txt"]);
    assert!(!tray.is_open());
}

#[test]
fn clear_closes_tray() {
    let mut tray = AttachmentTray::default();
    tray.add([picked("a.txt", 10)]);
    assert_eq!(tray.upload_label(), "Upload 1 File");
    tray.clear();
    assert!(!tray.is_open());
}

// =============================================================
// encode_upload
// =============================================================

#[test]
fn encode_upload_base64_encodes_bytes() {
    let upload = encode_upload(b"hi", "hi.txt", "text/plain");
    assert_eq!(upload.file, "aGk=");
    assert_eq!(upload.file_name, "hi.txt");
    assert_eq!(upload.file_type, "text/plain");
}

#[test]
fn encode_upload_defaults_missing_mime_type() {
    assert_eq!(encode_upload(b"", "blob", "").file_type, FALLBACK_MIME_TYPE);
}

// =============================================================
// UploadTracker
// =============================================================

#[test]
fn own_file_echo_completes_matching_upload() {
    let mut uploads = UploadTracker::default();
    uploads.start("l1", "a.txt");
    uploads.start("l2", "b.txt");

    assert!(uploads.complete_echo(&own_file_message("me", "b.txt"), "me"));
    assert_eq!(uploads.pending().len(), 1);
    assert_eq!(uploads.pending()[0].local_id, "l1");
    assert!(uploads.is_uploading());

    assert!(uploads.complete_echo(&own_file_message("me", "a.txt"), "me"));
    assert!(!uploads.is_uploading());
}

#[test]
fn echoes_from_other_users_or_text_do_not_complete() {
    let mut uploads = UploadTracker::default();
    uploads.start("l1", "a.txt");
    assert!(!uploads.complete_echo(&own_file_message("someone", "a.txt"), "me"));

    let text = ChatMessage::from_wire(&serde_json::json!({"userId": "me", "message": "a.txt"})).expect("text");
    assert!(!uploads.complete_echo(&text, "me"));
    assert!(uploads.is_uploading());
}

#[test]
fn renamed_own_echo_completes_oldest_pending_upload() {
    let mut uploads = UploadTracker::default();
    uploads.start("l1", "photo.png");
    uploads.start("l2", "notes.txt");

    assert!(uploads.complete_echo(&own_file_message("me", "1700-photo.png"), "me"));
    assert_eq!(uploads.pending().len(), 1);
    assert_eq!(uploads.pending()[0].local_id, "l2");

    assert!(uploads.complete_echo(&own_file_message("me", "notes.txt"), "me"));
    assert!(!uploads.is_uploading());
}

#[test]
fn own_echo_without_pending_uploads_is_ignored() {
    let mut uploads = UploadTracker::default();
    assert!(!uploads.complete_echo(&own_file_message("me", "a.txt"), "me"));
}

#[test]
fn fail_and_fail_all_drop_pending_entries() {
    let mut uploads = UploadTracker::default();
    uploads.start("l1", "a.txt");
    uploads.start("l2", "b.txt");
    assert!(uploads.fail("l1"));
    assert!(!uploads.fail("l1"));
    assert_eq!(uploads.fail_all(), 1);
    assert!(!uploads.is_uploading());
}
