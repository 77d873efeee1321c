use std::sync::Arc;

use eyedentify_types::AppEvent;
use kanal::AsyncSender;

use crate::state::AppState;

/// Re-send the latest history snapshot to the UI
pub async fn handle_show_history(
    state: Arc<AppState>,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    let records = state.history.read().await.clone();
    tracing::debug!("Showing {} history entries", records.len());

    app_to_ui_tx.send(AppEvent::HistoryUpdated(records)).await?;
    Ok(())
}
