use eyedentify_core::ScanSummary;
use eyedentify_types::{AppEvent, ScanRecord};
use kanal::AsyncReceiver;
use tokio_util::sync::CancellationToken;

/// Render one UI event as terminal output, or `None` for events with no output
pub fn render(event: &AppEvent) -> Option<String> {
    match event {
        AppEvent::ScanCompleted(record) => Some(format!(
            "[{}] {}\n{}",
            record.id,
            record.image_uri,
            ScanSummary::from_record(record)
        )),
        AppEvent::ScanFailed {
            image_uri,
            message,
            retryable,
        } => Some(if *retryable {
            format!("Error: {} ({}), try again", message, image_uri)
        } else {
            format!("Error: {} ({})", message, image_uri)
        }),
        AppEvent::HistoryUpdated(records) => Some(render_history(records)),
        _ => None,
    }
}

fn render_history(records: &[ScanRecord]) -> String {
    if records.is_empty() {
        return "History: no scans yet".to_string();
    }

    let mut out = format!("History ({} scans):", records.len());
    for record in records {
        let objects = if record.detected_objects.is_empty() {
            "-".to_string()
        } else {
            record.detected_objects.join(", ")
        };
        out.push_str(&format!(
            "\n  {}  {}  objects: {}  text: {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.image_uri,
            objects,
            record.detected_text.replace('\n', " ")
        ));
    }
    out
}

pub async fn ui_loop(
    app_to_ui_rx: AsyncReceiver<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = app_to_ui_rx.recv() => event?,
        };
        show(&event);
    }

    // Flush what the backend already produced
    while let Ok(Some(event)) = app_to_ui_rx.try_recv() {
        show(&event);
    }

    Ok(())
}

fn show(event: &AppEvent) {
    if let AppEvent::StatusUpdate { status, scanning } = event {
        tracing::info!("Status: {} (scanning: {})", status, scanning);
    }

    if let Some(text) = render(event) {
        println!("{}\n", text);
    }
}
