use std::sync::Arc;
use std::time::Duration;

use eyedentify_types::AppEvent;
use kanal::AsyncSender;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Keeps the history view in sync with the store.
///
/// Forwards every snapshot of the live subscription to the UI. When the
/// subscription ends, or the store refuses to open one, the error is
/// reported and the subscription is re-opened after a pause. Only
/// cancellation or a closed UI channel end the loop.
pub async fn history_loop(
    state: Arc<AppState>,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let retry_delay = {
        let config = state.config.read().await;
        Duration::from_millis(config.delta_time.saturating_mul(10))
    };

    // One status per failure streak, reset by the next good snapshot
    let mut reported = false;

    loop {
        let subscription = match state.store().subscribe().await {
            Ok(subscription) => Some(subscription),
            Err(e) if reported => {
                tracing::debug!("Scan history still unavailable: {}", e);
                None
            }
            Err(e) => {
                tracing::error!("Error loading scan history: {}", e);
                reported = true;
                let _ = app_to_ui_tx
                    .send(AppEvent::StatusUpdate {
                        status: "Error loading history".to_string(),
                        scanning: false,
                    })
                    .await;
                None
            }
        };

        if let Some(mut subscription) = subscription {
            loop {
                let snapshot = tokio::select! {
                    _ = cancel.cancelled() => {
                        // Dropping the subscription stops the store's pump
                        tracing::info!("History watcher stopping");
                        return Ok(());
                    }
                    snapshot = subscription.next() => snapshot,
                };

                match snapshot {
                    Some(Ok(records)) => {
                        tracing::debug!("History updated: {} scans", records.len());
                        reported = false;
                        *state.history.write().await = records.clone();
                        app_to_ui_tx.send(AppEvent::HistoryUpdated(records)).await?;
                    }
                    Some(Err(e)) => {
                        tracing::error!("History subscription error: {}", e);
                        reported = true;
                        let _ = app_to_ui_tx
                            .send(AppEvent::StatusUpdate {
                                status: "Error loading history".to_string(),
                                scanning: false,
                            })
                            .await;
                    }
                    None => break,
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = tokio::time::sleep(retry_delay) => {
                tracing::debug!("Re-subscribing to scan history");
            }
        }
    }
}
