//! Step failures and the recovery policy shared by every answer handler

use thiserror::Error;

use klinewatch_core::prelude::*;
use klinewatch_core::SessionEvent;
use klinewatch_net::{AnswerError, QueryKind, StatusCode};

use super::{UpdateAction, UpdateResult};
use crate::message::Message;
use crate::state::{AppState, SessionPhase};

/// Why a protocol step did not produce usable data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepFailure {
    /// No answer, or an HTTP-level error. Code 0 means no response at all.
    #[error("Error send request to http server. Code: {code}. {message}")]
    Transport { code: u16, message: String },

    #[error("Server answer with error. Code: {code}. Error: {message}")]
    Status { code: StatusCode, message: String },

    /// The package or its data body could not be decoded, or names
    /// something the session did not ask for
    #[error("{0}")]
    Malformed(String),
}

impl From<AnswerError> for StepFailure {
    fn from(e: AnswerError) -> Self {
        match e {
            AnswerError::Status { code, message } => StepFailure::Status { code, message },
            other => StepFailure::Malformed(other.to_string()),
        }
    }
}

/// Report `failure` of a `kind` step and decide what happens next.
///
/// - Login: stay logged out, retry after the retry delay
/// - PushConfig: diagnostic only
/// - anything else: full reset, `LoggedOut`, then retry login
pub(crate) fn step_failed(
    state: &mut AppState,
    kind: QueryKind,
    failure: StepFailure,
) -> UpdateResult {
    let text = format!("{}: {}", kind.label(), failure);
    warn!("{}", text);
    state.emit(SessionEvent::warning(text));

    match kind {
        QueryKind::PushConfig => UpdateResult::none(),
        QueryKind::Login => {
            state.phase = SessionPhase::LoggedOut;
            schedule_login(state)
        }
        _ => {
            let was_logged_in = state.is_logged_in();
            state.reset_session();
            if was_logged_in {
                state.emit(SessionEvent::LoggedOut);
            }
            schedule_login(state)
        }
    }
}

pub(crate) fn schedule_login(state: &AppState) -> UpdateResult {
    let delay = state.timing.retry_delay();
    debug!("Login retry in {:?}", delay);
    UpdateResult::action(UpdateAction::schedule(delay, Message::Login))
}
