//! Message processing
//!
//! Runs messages through the TEA update loop and resolves ticks into the
//! answers of outstanding requests.

use klinewatch_core::prelude::*;
use klinewatch_net::{Fetch, Transport};
use tokio::sync::{mpsc, watch};

use crate::actions::handle_action;
use crate::handler;
use crate::message::Message;
use crate::state::AppState;

/// Process a message through the TEA update function
pub fn process_message<F>(
    state: &mut AppState,
    message: Message,
    transport: &Transport<F>,
    msg_tx: &mpsc::Sender<Message>,
    shutdown_rx: &watch::Receiver<bool>,
) where
    F: Fetch + Sync + 'static,
{
    if let Message::Tick = message {
        tick(state, transport, msg_tx, shutdown_rx);
        return;
    }

    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m);

        if let Some(action) = result.action {
            handle_action(action, state, transport, msg_tx.clone(), shutdown_rx.clone());
        }

        msg = result.message;
    }
}

/// Collect outcomes of outstanding requests, then sweep expired ones.
///
/// An answer can reset the session, which abandons the remaining ids; those
/// are skipped and their outcomes are left for the sweep.
fn tick<F>(
    state: &mut AppState,
    transport: &Transport<F>,
    msg_tx: &mpsc::Sender<Message>,
    shutdown_rx: &watch::Receiver<bool>,
) where
    F: Fetch + Sync + 'static,
{
    for id in state.sent.ids() {
        if !state.sent.contains(id) {
            continue;
        }
        if let Some(outcome) = transport.poll_once(id) {
            process_message(
                state,
                Message::Answer { id, outcome },
                transport,
                msg_tx,
                shutdown_rx,
            );
        }
    }

    let expired = transport.sweep();
    if expired > 0 {
        debug!("Dropped {} expired outcome(s)", expired);
    }
}
