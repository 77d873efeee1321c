use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyedentify_config::Config;
use eyedentify_types::AppEvent;
use tracing_subscriber::EnvFilter;

mod cli;
mod controller;
mod detectors;
mod events;
mod history;
mod io;
mod state;
mod status;
mod ui;

#[cfg(test)]
mod tests;

use self::cli::Args;
use self::controller::AppController;
use self::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::new(),
    };

    init_tracing(args.log_json || config.log_json);

    let state = Arc::new(AppState::new(config)?);
    let controller = AppController::new(state);
    let mut tasks = controller.spawn_tasks();

    let events = controller.event_sender();
    for image_uri in args.images {
        events.send(AppEvent::Capture { image_uri }).await?;
    }

    if args.no_stdin {
        events.send(AppEvent::Quit).await?;
    } else {
        io::spawn_stdin_reader(tokio::runtime::Handle::current(), events.clone());
    }

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => tracing::info!("Shutdown requested"),
                Err(e) => tracing::error!("failed to listen for ctrl+c: {e}"),
            }
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::info!("task exited, shutting down"),
                Ok(Err(e)) => tracing::error!("task failed: {e}"),
                Err(e) => tracing::error!("task panicked: {e}"),
            }
        }
    }

    controller.shutdown();

    let drain = async {
        while let Some(result) = tasks.join_next().await {
            if let Ok(Err(e)) = result {
                tracing::warn!("task ended with error during shutdown: {e}");
            }
        }
    };
    if tokio::time::timeout(Duration::from_secs(5), drain).await.is_err() {
        tracing::warn!("Tasks did not stop in time, aborting");
        tasks.abort_all();
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
