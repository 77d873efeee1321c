use eyedentify_types::{AppEvent, ScanRecord};

use crate::ui::render;

fn record() -> ScanRecord {
    let mut record = ScanRecord::new(
        "file:///tmp/desk.jpg",
        "EXIT",
        vec!["cup (91%)".to_string(), "laptop (77%)".to_string()],
    );
    record.id = "abc".to_string();
    record
}

#[test]
fn completed_scan_shows_objects_and_text() {
    let text = render(&AppEvent::ScanCompleted(record())).expect("rendered");

    assert!(text.starts_with("[abc] file:///tmp/desk.jpg"));
    assert!(text.contains("cup (91%), laptop (77%)"));
    assert!(text.contains("Text found: EXIT"));
}

#[test]
fn retryable_failure_suggests_retry() {
    let retry = render(&AppEvent::ScanFailed {
        image_uri: "a.jpg".to_string(),
        message: "Failed to save scan data".to_string(),
        retryable: true,
    })
    .expect("rendered");
    let fatal = render(&AppEvent::ScanFailed {
        image_uri: "a.jpg".to_string(),
        message: "Failed to load image".to_string(),
        retryable: false,
    })
    .expect("rendered");

    assert!(retry.contains("try again"));
    assert!(!fatal.contains("try again"));
}

#[test]
fn history_lists_every_record() {
    let empty = render(&AppEvent::HistoryUpdated(vec![])).expect("rendered");
    assert_eq!(empty, "History: no scans yet");

    let full = render(&AppEvent::HistoryUpdated(vec![record(), record()])).expect("rendered");
    assert!(full.starts_with("History (2 scans):"));
    assert_eq!(full.matches("desk.jpg").count(), 2);
}

#[test]
fn status_updates_are_not_printed() {
    let event = AppEvent::StatusUpdate {
        status: "Ready".to_string(),
        scanning: false,
    };
    assert!(render(&event).is_none());
}
