use std::sync::Arc;

use eyedentify_types::AppEvent;
use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub mod capture;
pub mod clear_history;
pub mod show_history;

use capture::handle_capture;
use clear_history::handle_clear_history;
use show_history::handle_show_history;

/// App's main loop
///
/// Each capture runs as its own task with a child cancellation token, so
/// several scans can be in flight while commands keep being handled.
pub async fn event_loop(
    state: Arc<AppState>,
    ui_to_app_rx: AsyncReceiver<AppEvent>,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut scans = JoinSet::new();

    tracing::info!("[EVENT_LOOP] Starting main loop, waiting for events");
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("[EVENT_LOOP] Cancelled, abandoning {} scans", scans.len());
                scans.shutdown().await;
                return Ok(());
            }
            Some(_) = scans.join_next(), if !scans.is_empty() => continue,
            event = ui_to_app_rx.recv() => event?,
        };

        tracing::debug!(
            "[EVENT_LOOP] EVENT RECEIVED: {:?}",
            std::mem::discriminant(&event)
        );

        match event {
            AppEvent::Capture { image_uri } => {
                let state = state.clone();
                let tx = app_to_ui_tx.clone();
                let scan_cancel = cancel.child_token();
                scans.spawn(async move {
                    if let Err(e) = handle_capture(state, image_uri, &tx, &scan_cancel).await {
                        tracing::error!("Capture handling failed: {}", e);
                    }
                });
            }
            AppEvent::ClearHistory => {
                handle_clear_history(state.clone(), &app_to_ui_tx).await?;
            }
            AppEvent::ShowHistory => {
                handle_show_history(state.clone(), &app_to_ui_tx).await?;
            }
            AppEvent::Quit => {
                tracing::info!("[EVENT_LOOP] Quit requested, waiting for {} scans", scans.len());
                while scans.join_next().await.is_some() {}
                return Ok(());
            }
            AppEvent::ScanCompleted(_)
            | AppEvent::ScanFailed { .. }
            | AppEvent::HistoryUpdated(_)
            | AppEvent::StatusUpdate { .. } => {
                // UI-only events, ignore in backend
            }
        }
    }
}
