//! Headless mode runner - main event loop
//!
//! Drives the engine, forwards its session events to stdout as NDJSON and
//! turns stdin lines into commands.

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use klinewatch_app::config::Settings;
use klinewatch_app::{signals, Engine, Message};
use klinewatch_core::prelude::*;
use klinewatch_core::{ExchangeId, SessionEvent, SymbolId, UserConfig};
use klinewatch_net::Fetch;

use super::HeadlessEvent;

/// Run in headless mode against the configured server
pub async fn run_headless(settings: Settings) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("klinewatch starting in HEADLESS mode");
    info!("Server: {}", settings.server.base_url);
    info!("═══════════════════════════════════════════════════════");

    let mut engine = Engine::connect(&settings).context("Failed to create engine")?;
    let mut events = engine.subscribe();

    signals::spawn_signal_handler(engine.msg_sender());

    // Spawn headless-specific stdin reader
    let stdin_tx = engine.msg_sender();
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(stdin_tx);
    });

    engine.start();
    emit_pending(&mut events);

    headless_event_loop(&mut engine, &mut events).await;

    engine.shutdown().await;
    emit_pending(&mut events);

    info!("klinewatch headless mode exiting");
    Ok(())
}

/// Main headless event loop
async fn headless_event_loop<F>(
    engine: &mut Engine<F>,
    events: &mut broadcast::Receiver<SessionEvent>,
) where
    F: Fetch + Sync + 'static,
{
    loop {
        if engine.should_quit() {
            info!("Quit requested");
            break;
        }

        match engine.msg_rx.recv().await {
            Some(msg) => {
                engine.process_message(msg);
                emit_pending(events);
            }
            None => {
                info!("Message channel closed");
                break;
            }
        }
    }
}

/// Write every event published since the last call
fn emit_pending(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => HeadlessEvent::from(event).emit(),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!("Headless output lagged, {} event(s) skipped", skipped);
            }
            Err(_) => break,
        }
    }
}

/// Parse one stdin line.
///
/// `Ok(None)` for blank lines; `Err` carries a message for the user.
pub fn parse_command(line: &str) -> std::result::Result<Option<Message>, String> {
    let trimmed = line.trim();
    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    match command {
        "" => Ok(None),
        "q" | "quit" => Ok(Some(Message::Quit)),
        "logout" => Ok(Some(Message::Logout)),
        "config" => {
            if rest.is_empty() {
                return Err("Usage: config <json>".to_string());
            }
            serde_json::from_str::<UserConfig>(rest)
                .map(|config| Some(Message::PushConfig(config)))
                .map_err(|e| format!("Invalid config JSON: {}", e))
        }
        "blacklist" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            match parts.as_slice() {
                ["add", exchange, symbol] => Ok(Some(Message::BlacklistAdd {
                    exchange: ExchangeId::new(*exchange),
                    symbol: SymbolId::new(*symbol),
                })),
                ["remove", exchange, symbol] => Ok(Some(Message::BlacklistRemove {
                    exchange: ExchangeId::new(*exchange),
                    symbol: SymbolId::new(*symbol),
                })),
                _ => Err("Usage: blacklist add|remove <exchange> <symbol>".to_string()),
            }
        }
        other => Err(format!("Unknown command: {}", other)),
    }
}

/// Spawn stdin reader task that sends commands to message channel (blocking version)
fn spawn_stdin_reader_blocking(msg_tx: mpsc::Sender<Message>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        match line {
            Ok(line) => match parse_command(&line) {
                Ok(Some(msg)) => {
                    let quit = matches!(msg, Message::Quit);
                    info!("Stdin: {:?} requested", msg);
                    if msg_tx.blocking_send(msg).is_err() || quit {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => {
                    warn!("Stdin: {}", message);
                    HeadlessEvent::error(message, false).emit();
                }
            },
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    info!("Stdin reader exiting");
}
