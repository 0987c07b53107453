//! Answer handlers: turn a request outcome into the next session step

use klinewatch_core::prelude::*;
use klinewatch_core::{DiagnosticLevel, SessionEvent};
use klinewatch_net::{
    parse_answer, AckAnswer, DetectAnswer, KLinesIdListAnswer, LoginAnswer, Outcome, Query,
    QueryKind, RequestId, StockExchangesAnswer,
};

use super::step::{step_failed, StepFailure};
use super::update::{begin_login, send, send_logout};
use super::{UpdateAction, UpdateResult};
use crate::message::Message;
use crate::state::{AppState, SessionPhase};

/// Route the outcome of request `id` to the handler for its query kind
pub(crate) fn handle_answer(state: &mut AppState, id: RequestId, outcome: Outcome) -> UpdateResult {
    let Some(sent) = state.sent.remove(id) else {
        warn!("Answer for unknown request #{}, ignored", id);
        return UpdateResult::none();
    };

    let kind = sent.kind();
    trace!(
        "Request #{} ({}) answered after {:?}",
        id,
        kind.label(),
        sent.sent_at.elapsed()
    );

    let payload = match outcome {
        Outcome::Success { payload, .. } => payload,
        Outcome::Failure { code, message, .. } => {
            return step_failed(state, kind, StepFailure::Transport { code, message });
        }
    };

    match kind {
        QueryKind::Login => on_login(state, &payload),
        QueryKind::ListExchanges => on_exchanges(state, &payload),
        QueryKind::ListSymbols => on_symbols(state, &payload),
        QueryKind::PollDetections => on_detections(state, &payload),
        QueryKind::PushConfig => on_config(state, &payload),
        QueryKind::Logout => on_logout(state, &payload),
    }
}

fn diagnostic(state: &mut AppState, level: DiagnosticLevel, kind: QueryKind, text: &str) {
    state.emit(SessionEvent::Diagnostic {
        level,
        message: format!("{}: {}", kind.label(), text),
    });
}

fn success_text(server_message: &str) -> String {
    if server_message.is_empty() {
        "Successfully".to_string()
    } else {
        format!("Successfully. Server message: {}", server_message)
    }
}

fn on_login(state: &mut AppState, payload: &[u8]) -> UpdateResult {
    let kind = QueryKind::Login;
    let answer: LoginAnswer = match parse_answer(payload) {
        Ok(answer) => answer,
        Err(e) => return step_failed(state, kind, e.into()),
    };

    if answer.session_id == 0 {
        return step_failed(
            state,
            kind,
            StepFailure::Malformed("Server assigned session id 0".to_string()),
        );
    }

    info!("Logged in, session {}", answer.session_id);
    state.session_id = answer.session_id;
    state.user_config = answer.config.clone();
    state.phase = SessionPhase::CatalogExchanges;

    state.emit(SessionEvent::LoggedIn {
        config: answer.config,
    });
    diagnostic(state, DiagnosticLevel::Info, kind, &success_text(&answer.message));

    send(
        state,
        Query::ListExchanges {
            session_id: state.session_id,
        },
    )
}

fn on_exchanges(state: &mut AppState, payload: &[u8]) -> UpdateResult {
    let kind = QueryKind::ListExchanges;
    let answer: StockExchangesAnswer = match parse_answer(payload) {
        Ok(answer) => answer,
        Err(e) => return step_failed(state, kind, e.into()),
    };

    state.pending_exchanges = answer.stock_exchanges.iter().cloned().collect();
    state.emit(SessionEvent::ExchangeCatalog {
        exchanges: answer.stock_exchanges,
    });

    if state.pending_exchanges.is_empty() {
        warn!("Server reported no stock exchanges");
        state.phase = SessionPhase::EmptyCatalog;
        state.emit(SessionEvent::CatalogEmpty);
        diagnostic(
            state,
            DiagnosticLevel::Warning,
            kind,
            "Stock exchange list is empty, nothing to watch",
        );
        if state.logout_pending {
            return send_logout(state);
        }
        return UpdateResult::none();
    }

    diagnostic(state, DiagnosticLevel::Info, kind, &success_text(&answer.message));
    state.phase = SessionPhase::CatalogSymbols;
    if state.logout_pending {
        return send_logout(state);
    }
    request_next_symbols(state)
}

fn on_symbols(state: &mut AppState, payload: &[u8]) -> UpdateResult {
    let kind = QueryKind::ListSymbols;
    let answer: KLinesIdListAnswer = match parse_answer(payload) {
        Ok(answer) => answer,
        Err(e) => return step_failed(state, kind, e.into()),
    };

    if !state.pending_exchanges.remove(&answer.stock_exchange) {
        return step_failed(
            state,
            kind,
            StepFailure::Malformed(format!(
                "Undefined stock exchange: {}",
                answer.stock_exchange
            )),
        );
    }

    if answer.klines.is_empty() {
        diagnostic(
            state,
            DiagnosticLevel::Warning,
            kind,
            &format!("No k-lines on {}", answer.stock_exchange),
        );
    } else {
        diagnostic(
            state,
            DiagnosticLevel::Info,
            kind,
            &format!(
                "{} k-line(s) on {}. {}",
                answer.klines.len(),
                answer.stock_exchange,
                success_text(&answer.message)
            ),
        );
    }

    state.emit(SessionEvent::SymbolCatalog {
        exchange: answer.stock_exchange,
        symbols: answer.klines,
    });

    if state.logout_pending {
        return send_logout(state);
    }

    if !state.pending_exchanges.is_empty() {
        return request_next_symbols(state);
    }

    info!("Catalog complete, starting detection polls");
    state.phase = SessionPhase::Polling;
    send(
        state,
        Query::PollDetections {
            session_id: state.session_id,
        },
    )
}

fn request_next_symbols(state: &AppState) -> UpdateResult {
    let Some(exchange) = state.pending_exchanges.first().cloned() else {
        return UpdateResult::none();
    };
    send(
        state,
        Query::ListSymbols {
            session_id: state.session_id,
            exchange,
        },
    )
}

fn on_detections(state: &mut AppState, payload: &[u8]) -> UpdateResult {
    let kind = QueryKind::PollDetections;
    let answer: DetectAnswer = match parse_answer(payload) {
        Ok(answer) => answer,
        Err(e) => return step_failed(state, kind, e.into()),
    };

    if answer.detected.is_empty() {
        diagnostic(
            state,
            DiagnosticLevel::Debug,
            kind,
            "Successfully. Detect data list is empty",
        );
    } else {
        debug!("{} detection(s) received", answer.detected.len());
        diagnostic(
            state,
            DiagnosticLevel::Info,
            kind,
            &format!(
                "{} detection(s). {}",
                answer.detected.len(),
                success_text(&answer.message)
            ),
        );
        state.emit(SessionEvent::Detections {
            detections: answer.detected,
        });
    }

    if state.logout_pending {
        return send_logout(state);
    }

    UpdateResult::action(UpdateAction::schedule(
        state.timing.poll_interval(),
        Message::PollDetections { epoch: state.epoch },
    ))
}

fn on_config(state: &mut AppState, payload: &[u8]) -> UpdateResult {
    let kind = QueryKind::PushConfig;
    match parse_answer::<AckAnswer>(payload) {
        Ok(answer) => {
            diagnostic(state, DiagnosticLevel::Info, kind, &success_text(&answer.message));
            UpdateResult::none()
        }
        Err(e) => step_failed(state, kind, e.into()),
    }
}

fn on_logout(state: &mut AppState, payload: &[u8]) -> UpdateResult {
    let kind = QueryKind::Logout;
    let answer: AckAnswer = match parse_answer(payload) {
        Ok(answer) => answer,
        Err(e) => return step_failed(state, kind, e.into()),
    };

    info!("Logged out of session {}", state.session_id);
    state.reset_session();
    state.emit(SessionEvent::LoggedOut);
    diagnostic(state, DiagnosticLevel::Info, kind, &success_text(&answer.message));

    begin_login(state)
}
