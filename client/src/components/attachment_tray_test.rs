use super::*;
use crate::state::attachments::PickedFile;

fn picked(name: &str, size_bytes: u64) -> PickedFile<()> {
    PickedFile { handle: (), name: name.to_owned(), mime_type: "text/plain".to_owned(), size_bytes }
}

#[test]
fn row_label_includes_size_in_kilobytes() {
    assert_eq!(attachment_row_label("notes.txt", 1536), "notes.txt (1.5 KB)");
}

#[test]
fn heading_tracks_tray_length() {
    let mut tray = AttachmentTray::<()>::default();
    assert_eq!(tray_heading(&tray), "Selected Files (0)");
    tray.add([picked("a.txt", 10), picked("b.txt", 20)]);
    assert_eq!(tray_heading(&tray), "Selected Files (2)");
}
