use std::sync::Arc;

use eyedentify_types::AppEvent;
use kanal::AsyncSender;

use crate::state::AppState;

pub async fn handle_clear_history(
    state: Arc<AppState>,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    let status = match state.store().delete_all().await {
        Ok(()) => "History cleared".to_string(),
        Err(e) => {
            tracing::error!("Error clearing history: {}", e);
            format!("Error clearing history: {}", e)
        }
    };

    // The live subscription delivers the emptied list on its own
    app_to_ui_tx
        .send(AppEvent::StatusUpdate {
            status,
            scanning: false,
        })
        .await?;

    Ok(())
}
