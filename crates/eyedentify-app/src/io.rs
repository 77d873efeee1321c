use std::io::BufRead;

use eyedentify_types::AppEvent;
use kanal::AsyncSender;
use tokio::runtime::Handle;

/// Map one input line to an event. Blank lines are ignored.
pub fn parse_command(line: &str) -> Option<AppEvent> {
    let line = line.trim();

    match line {
        "" => None,
        "clear" => Some(AppEvent::ClearHistory),
        "history" => Some(AppEvent::ShowHistory),
        "quit" | "exit" => Some(AppEvent::Quit),
        uri => Some(AppEvent::Capture {
            image_uri: uri.to_string(),
        }),
    }
}

/// Read commands from stdin on a plain thread.
///
/// Stdin reads cannot be interrupted, so they stay off the runtime's
/// blocking pool to keep shutdown from waiting on them. EOF sends `Quit`.
pub fn spawn_stdin_reader(handle: Handle, event_tx: AsyncSender<AppEvent>) {
    let spawned = std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();

            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!("Failed to read stdin: {}", e);
                        break;
                    }
                };

                let Some(event) = parse_command(&line) else {
                    continue;
                };
                let quit = matches!(event, AppEvent::Quit);

                if let Err(e) = handle.block_on(event_tx.send(event)) {
                    tracing::debug!("Event loop gone, stdin reader stopping: {}", e);
                    return;
                }
                if quit {
                    return;
                }
            }

            let _ = handle.block_on(event_tx.send(AppEvent::Quit));
        });

    if let Err(e) = spawned {
        tracing::error!("Failed to start stdin reader: {}", e);
    }
}
