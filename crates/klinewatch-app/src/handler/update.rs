//! Main update function - handles state transitions (TEA pattern)

use klinewatch_core::prelude::*;
use klinewatch_core::SessionEvent;
use klinewatch_net::Query;

use super::answer::handle_answer;
use super::{UpdateAction, UpdateResult};
use crate::message::Message;
use crate::state::{AppState, SessionPhase};

/// Process a message and update state.
///
/// `Message::Tick` is resolved by the engine into `Message::Answer`s before
/// it reaches this function; here it is a no-op.
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::Tick => UpdateResult::none(),

        Message::Answer { id, outcome } => handle_answer(state, id, outcome),

        Message::Login => {
            if state.phase != SessionPhase::LoggedOut {
                debug!("Login ignored in phase {:?}", state.phase);
                return UpdateResult::none();
            }
            begin_login(state)
        }

        Message::PollDetections { epoch } => {
            if state.phase != SessionPhase::Polling || epoch != state.epoch {
                debug!(
                    "Stale detection poll dropped (epoch {}, current {}, phase {:?})",
                    epoch, state.epoch, state.phase
                );
                return UpdateResult::none();
            }
            send(
                state,
                Query::PollDetections {
                    session_id: state.session_id,
                },
            )
        }

        Message::PushConfig(config) => {
            if !state.is_logged_in() {
                let text = "Config: Not logged in, config not sent";
                warn!("{}", text);
                state.emit(SessionEvent::warning(text));
                return UpdateResult::none();
            }
            state.user_config = config.clone();
            send(
                state,
                Query::PushConfig {
                    session_id: state.session_id,
                    config,
                },
            )
        }

        Message::BlacklistAdd { exchange, symbol } => {
            let mut config = state.user_config.clone();
            if !config.add_to_blacklist(exchange.clone(), symbol.clone()) {
                debug!("{} {} already black-listed", exchange, symbol);
                return UpdateResult::none();
            }
            info!("Black-listing {} {}", exchange, symbol);
            UpdateResult::message(Message::PushConfig(config))
        }

        Message::BlacklistRemove { exchange, symbol } => {
            let mut config = state.user_config.clone();
            if !config.remove_from_blacklist(&exchange, &symbol) {
                debug!("{} {} not black-listed", exchange, symbol);
                return UpdateResult::none();
            }
            info!("Removing {} {} from black list", exchange, symbol);
            UpdateResult::message(Message::PushConfig(config))
        }

        Message::Logout => {
            if !state.is_logged_in() || state.phase == SessionPhase::LoggingOut {
                debug!("Logout ignored in phase {:?}", state.phase);
                return UpdateResult::none();
            }
            if state.sent.has_sequence_request() {
                info!("Logout held until the {:?} step is answered", state.phase);
                state.logout_pending = true;
                return UpdateResult::none();
            }
            send_logout(state)
        }

        Message::Quit => {
            info!("Quit requested");
            state.request_quit();
            UpdateResult::none()
        }
    }
}

/// Drop whatever is left of the previous session and send a Login
pub(crate) fn begin_login(state: &mut AppState) -> UpdateResult {
    state.reset_session();
    state.phase = SessionPhase::LoggingIn;
    info!("Logging in as '{}'", state.account.user);
    send(
        state,
        Query::Login {
            user: state.account.user.clone(),
            password: state.account.password.clone(),
        },
    )
}

/// Send the Logout, replacing whatever step would have come next
pub(crate) fn send_logout(state: &mut AppState) -> UpdateResult {
    state.logout_pending = false;
    state.phase = SessionPhase::LoggingOut;
    info!("Logging out of session {}", state.session_id);
    send(
        state,
        Query::Logout {
            session_id: state.session_id,
        },
    )
}

/// Emit a Send action, suppressing session-bound queries while logged out
pub(crate) fn send(state: &AppState, query: Query) -> UpdateResult {
    if query.session_id() == Some(0) || (query.session_id().is_some() && !state.is_logged_in())
    {
        debug!("Suppressed {} while logged out", query.kind().label());
        return UpdateResult::none();
    }
    UpdateResult::action(UpdateAction::Send(query))
}
