//! Action handlers: UpdateAction dispatch and background task spawning

use klinewatch_core::prelude::*;
use klinewatch_net::{Fetch, Transport};
use tokio::sync::{mpsc, watch};

use crate::handler::UpdateAction;
use crate::message::Message;
use crate::state::AppState;

/// Execute an action.
///
/// `Send` goes through the transport immediately and the query is recorded
/// as outstanding. `Schedule` spawns a timer task that posts the message
/// back unless shutdown is signalled first.
pub fn handle_action<F>(
    action: UpdateAction,
    state: &mut AppState,
    transport: &Transport<F>,
    msg_tx: mpsc::Sender<Message>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    F: Fetch + Sync + 'static,
{
    match action {
        UpdateAction::Send(query) => {
            let id = transport.send(&query);
            state.sent.insert(id, query);
        }

        UpdateAction::Schedule { delay, message } => {
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        if msg_tx.send(*message).await.is_err() {
                            debug!("Message channel closed before scheduled message");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        trace!("Scheduled message cancelled by shutdown");
                    }
                }
            });
        }
    }
}
