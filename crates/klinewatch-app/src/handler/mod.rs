//! Handler module - TEA update function and answer handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `answer`: Interpretation of request outcomes per query kind
//! - `step`: Step failure taxonomy and the reset-and-retry policy

pub(crate) mod answer;
pub(crate) mod step;
pub(crate) mod update;

#[cfg(test)]
mod tests;

use std::time::Duration;

use klinewatch_net::Query;

use crate::message::Message;

pub use step::StepFailure;
pub use update::update;

/// Actions that the event loop should perform after update
#[derive(Debug, Clone)]
pub enum UpdateAction {
    /// Send a query; the engine records it under the returned request id
    Send(Query),

    /// Post `message` back into the loop after `delay`
    Schedule { delay: Duration, message: Box<Message> },
}

impl UpdateAction {
    pub fn schedule(delay: Duration, message: Message) -> Self {
        UpdateAction::Schedule {
            delay,
            message: Box::new(message),
        }
    }
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}
