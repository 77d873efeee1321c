use std::sync::Arc;

use eyedentify_core::{ProcessingError, ScanSummary};
use eyedentify_types::AppEvent;
use kanal::AsyncSender;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub async fn handle_capture(
    state: Arc<AppState>,
    image_uri: String,
    app_to_ui_tx: &AsyncSender<AppEvent>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    tracing::debug!(">>> [SCAN] Triggered for {}", image_uri);

    state.status.scan.write().await.started();
    let _ = app_to_ui_tx
        .send(AppEvent::StatusUpdate {
            status: format!("Scanning {}", image_uri),
            scanning: true,
        })
        .await;

    let result = state.workflow.process_with_cancel(&image_uri, cancel).await;

    let scanning = {
        let mut status = state.status.scan.write().await;
        match &result {
            Ok(record) => status.finished(true, ScanSummary::from_record(record).spoken()),
            Err(e) => status.finished(false, e.user_message()),
        }
        status.scanning()
    };

    match result {
        Ok(record) => {
            tracing::debug!(">>> [SCAN] Saved {} ({} objects)", record.id, record.detected_objects.len());
            app_to_ui_tx.send(AppEvent::ScanCompleted(record)).await?;
        }
        Err(ProcessingError::Cancelled) => {
            tracing::info!(">>> [SCAN] Cancelled: {}", image_uri);
        }
        Err(e) => {
            tracing::error!(">>> [SCAN] Failed: {}", e);
            app_to_ui_tx
                .send(AppEvent::ScanFailed {
                    image_uri,
                    message: e.user_message().to_string(),
                    retryable: e.is_retryable(),
                })
                .await?;
        }
    }

    let _ = app_to_ui_tx
        .send(AppEvent::StatusUpdate {
            status: if scanning { "Scanning..." } else { "Ready" }.to_string(),
            scanning,
        })
        .await;

    Ok(())
}
