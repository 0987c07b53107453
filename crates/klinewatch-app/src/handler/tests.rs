//! Tests for the update function and answer handlers

use std::time::Duration;

use klinewatch_core::{DiagnosticLevel, ExchangeId, SessionEvent, SymbolId, UserConfig};
use klinewatch_net::test_utils::*;
use klinewatch_net::{next_request_id, Outcome, Query, QueryKind, RequestId};

use super::update::send;
use super::{update, UpdateAction, UpdateResult};
use crate::config::Settings;
use crate::message::Message;
use crate::state::{AppState, SessionPhase};

fn test_state() -> AppState {
    let mut settings = Settings::default();
    settings.account.user = "trader".to_string();
    settings.account.password = "secret".to_string();
    AppState::new(&settings)
}

/// The query a result asks the engine to send
fn sent_query(result: &UpdateResult) -> Option<Query> {
    match &result.action {
        Some(UpdateAction::Send(query)) => Some(query.clone()),
        _ => None,
    }
}

fn expect_send(result: &UpdateResult) -> Query {
    sent_query(result).unwrap_or_else(|| panic!("expected Send action, got {:?}", result))
}

fn expect_schedule(result: &UpdateResult) -> (Duration, Message) {
    match &result.action {
        Some(UpdateAction::Schedule { delay, message }) => (*delay, (**message).clone()),
        other => panic!("expected Schedule action, got {:?}", other),
    }
}

/// Record `query` as sent, as the engine would
fn record(state: &mut AppState, query: Query) -> RequestId {
    let id = next_request_id();
    state.sent.insert(id, query);
    id
}

/// Record the query requested by `result` and answer it with `outcome`
fn answer(state: &mut AppState, result: &UpdateResult, outcome: Outcome) -> UpdateResult {
    let id = record(state, expect_send(result));
    update(state, Message::Answer { id, outcome })
}

fn ok(payload: Vec<u8>) -> Outcome {
    Outcome::success(payload)
}

fn count_logged_out(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SessionEvent::LoggedOut))
        .count()
}

/// Log in as session `session_id` and return the ListExchanges result
fn logged_in(state: &mut AppState, session_id: u64) -> UpdateResult {
    let login = update(state, Message::Login);
    answer(state, &login, ok(login_payload(session_id)))
}

/// Run login and catalog for `exchanges`, returning the first poll result
fn polling(state: &mut AppState, session_id: u64, exchanges: &[&str]) -> UpdateResult {
    let list = logged_in(state, session_id);
    let mut result = answer(state, &list, ok(exchanges_payload(exchanges)));
    for exchange in exchanges {
        result = answer(state, &result, ok(symbols_payload(exchange, &["X"])));
    }
    state.take_events();
    result
}

// ─────────────────────────────────────────────────────────────────
// Login
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_login_sends_credentials() {
    let mut state = test_state();
    let result = update(&mut state, Message::Login);

    assert_eq!(
        expect_send(&result),
        Query::Login {
            user: "trader".to_string(),
            password: "secret".to_string(),
        }
    );
    assert_eq!(state.phase, SessionPhase::LoggingIn);
}

#[test]
fn test_login_ignored_when_not_logged_out() {
    let mut state = test_state();
    update(&mut state, Message::Login);

    let again = update(&mut state, Message::Login);
    assert!(again.action.is_none());
}

#[test]
fn test_login_success_stores_session_and_lists_exchanges() {
    let mut state = test_state();
    let result = logged_in(&mut state, 42);

    assert_eq!(state.session_id, 42);
    assert_eq!(state.phase, SessionPhase::CatalogExchanges);
    assert_eq!(state.user_config.filters.len(), 1);
    assert_eq!(
        expect_send(&result),
        Query::ListExchanges { session_id: 42 }
    );

    let events = state.take_events();
    assert!(matches!(events[0], SessionEvent::LoggedIn { .. }));
    assert!(events.iter().any(|e| matches!(e,
        SessionEvent::Diagnostic { level: DiagnosticLevel::Info, message }
            if message == "Login: Successfully. Server message: welcome")));
}

#[test]
fn test_login_error_status_schedules_retry() {
    let mut state = test_state();
    let login = update(&mut state, Message::Login);
    let result = answer(
        &mut state,
        &login,
        ok(error_package("UNAUTHORIZED", "wrong password")),
    );

    let (delay, message) = expect_schedule(&result);
    assert_eq!(delay, Duration::from_millis(5000));
    assert!(matches!(message, Message::Login));
    assert_eq!(state.session_id, 0);
    assert_eq!(state.phase, SessionPhase::LoggedOut);

    let events = state.take_events();
    assert_eq!(count_logged_out(&events), 0);
    assert!(events.iter().any(|e| matches!(e,
        SessionEvent::Diagnostic { level: DiagnosticLevel::Warning, message }
            if message == "Login: Server answer with error. Code: UNAUTHORIZED. Error: wrong password")));
}

#[test]
fn test_login_transport_failure_schedules_retry() {
    let mut state = test_state();
    let login = update(&mut state, Message::Login);
    let result = answer(&mut state, &login, Outcome::failure(0, "connection refused"));

    let (_, message) = expect_schedule(&result);
    assert!(matches!(message, Message::Login));
    assert_eq!(count_logged_out(&state.take_events()), 0);

    // The retry is accepted once it fires
    let retry = update(&mut state, Message::Login);
    assert!(matches!(expect_send(&retry), Query::Login { .. }));
}

#[test]
fn test_login_with_zero_session_id_is_a_failure() {
    let mut state = test_state();
    let login = update(&mut state, Message::Login);
    let result = answer(&mut state, &login, ok(login_payload(0)));

    expect_schedule(&result);
    assert_eq!(state.phase, SessionPhase::LoggedOut);
}

#[test]
fn test_garbage_login_answer_is_a_failure() {
    let mut state = test_state();
    let login = update(&mut state, Message::Login);
    let result = answer(&mut state, &login, ok(b"<html>502</html>".to_vec()));

    expect_schedule(&result);
    let events = state.take_events();
    assert!(events.iter().any(|e| matches!(e,
        SessionEvent::Diagnostic { message, .. } if message.starts_with("Login: Error parsing package"))));
}

// ─────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_catalog_walks_exchanges_in_order() {
    let mut state = test_state();
    let list = logged_in(&mut state, 42);

    let first = answer(&mut state, &list, ok(exchanges_payload(&["B", "A"])));
    assert_eq!(state.phase, SessionPhase::CatalogSymbols);
    assert_eq!(
        expect_send(&first),
        Query::ListSymbols {
            session_id: 42,
            exchange: ExchangeId::new("A"),
        }
    );

    let second = answer(&mut state, &first, ok(symbols_payload("A", &["A1"])));
    assert_eq!(
        expect_send(&second),
        Query::ListSymbols {
            session_id: 42,
            exchange: ExchangeId::new("B"),
        }
    );

    let poll = answer(&mut state, &second, ok(symbols_payload("B", &["B1", "B2"])));
    assert_eq!(state.phase, SessionPhase::Polling);
    assert!(state.pending_exchanges.is_empty());
    assert_eq!(
        expect_send(&poll),
        Query::PollDetections { session_id: 42 }
    );

    let catalogs: Vec<(ExchangeId, Vec<SymbolId>)> = state
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::SymbolCatalog { exchange, symbols } => Some((exchange, symbols)),
            _ => None,
        })
        .collect();
    assert_eq!(catalogs.len(), 2);
    assert_eq!(catalogs[0].0, ExchangeId::new("A"));
    assert_eq!(catalogs[1].1.len(), 2);
}

#[test]
fn test_empty_exchange_list_enters_empty_catalog() {
    let mut state = test_state();
    let list = logged_in(&mut state, 42);
    state.take_events();

    let result = answer(&mut state, &list, ok(exchanges_payload(&[])));

    assert!(result.action.is_none());
    assert_eq!(state.phase, SessionPhase::EmptyCatalog);
    assert_eq!(state.session_id, 42);

    let events = state.take_events();
    assert!(events.contains(&SessionEvent::CatalogEmpty));
    assert!(events.iter().any(|e| matches!(e,
        SessionEvent::Diagnostic { level: DiagnosticLevel::Warning, .. })));

    // Nothing is ever polled from here
    let epoch = state.epoch;
    let poll = update(&mut state, Message::PollDetections { epoch });
    assert!(poll.action.is_none());
}

#[test]
fn test_symbols_for_unknown_exchange_resets() {
    let mut state = test_state();
    let list = logged_in(&mut state, 42);
    let first = answer(&mut state, &list, ok(exchanges_payload(&["A"])));
    state.take_events();

    let result = answer(&mut state, &first, ok(symbols_payload("Z", &["Z1"])));

    expect_schedule(&result);
    assert_eq!(state.session_id, 0);
    let events = state.take_events();
    assert_eq!(count_logged_out(&events), 1);
    assert!(events.iter().any(|e| matches!(e,
        SessionEvent::Diagnostic { message, .. }
            if message == "KLinesIDList: Undefined stock exchange: Z")));
}

#[test]
fn test_exchange_list_failure_resets_once() {
    let mut state = test_state();
    let list = logged_in(&mut state, 42);
    state.take_events();

    let result = answer(&mut state, &list, Outcome::failure(500, "boom"));

    let (delay, message) = expect_schedule(&result);
    assert_eq!(delay, Duration::from_millis(5000));
    assert!(matches!(message, Message::Login));
    assert_eq!(state.session_id, 0);
    assert_eq!(state.phase, SessionPhase::LoggedOut);
    assert_eq!(count_logged_out(&state.take_events()), 1);
}

#[test]
fn test_no_poll_before_catalog_drained() {
    let mut state = test_state();
    let list = logged_in(&mut state, 42);
    answer(&mut state, &list, ok(exchanges_payload(&["A", "B"])));

    let epoch = state.epoch;
    let poll = update(&mut state, Message::PollDetections { epoch });
    assert!(poll.action.is_none());
}

// ─────────────────────────────────────────────────────────────────
// Polling
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_empty_poll_schedules_next_without_event() {
    let mut state = test_state();
    let poll = polling(&mut state, 42, &["A"]);

    let result = answer(&mut state, &poll, ok(detect_payload(vec![])));

    let (delay, message) = expect_schedule(&result);
    assert_eq!(delay, Duration::from_millis(5000));
    assert!(matches!(message, Message::PollDetections { .. }));

    let events = state.take_events();
    assert!(!events
        .iter()
        .any(|e| matches!(e, SessionEvent::Detections { .. })));
    assert!(events.iter().all(|e| matches!(e,
        SessionEvent::Diagnostic { level: DiagnosticLevel::Debug, .. })));

    let next = update(&mut state, message);
    assert_eq!(
        expect_send(&next),
        Query::PollDetections { session_id: 42 }
    );
}

#[test]
fn test_detections_emitted_and_next_poll_scheduled() {
    let mut state = test_state();
    let poll = polling(&mut state, 42, &["BINANCE"]);

    let result = answer(
        &mut state,
        &poll,
        ok(detect_payload(vec![
            detection_json("BINANCE", "BTCUSDT"),
            detection_json("BINANCE", "ETHUSDT"),
        ])),
    );

    expect_schedule(&result);
    let detections: Vec<_> = state
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::Detections { detections } => Some(detections),
            _ => None,
        })
        .collect();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].len(), 2);
}

#[test]
fn test_poll_transport_failure_resets_session() {
    let mut state = test_state();
    let poll = polling(&mut state, 42, &["A"]);
    let epoch = state.epoch;

    let result = answer(&mut state, &poll, Outcome::failure(0, "timed out"));

    let (_, message) = expect_schedule(&result);
    assert!(matches!(message, Message::Login));
    assert_eq!(state.session_id, 0);
    assert!(state.sent.is_empty());
    assert_eq!(count_logged_out(&state.take_events()), 1);

    // A poll timer that fires after the reset is dropped
    let stale = update(&mut state, Message::PollDetections { epoch });
    assert!(stale.action.is_none());
}

#[test]
fn test_poll_error_status_resets_session() {
    let mut state = test_state();
    let poll = polling(&mut state, 42, &["A"]);

    answer(
        &mut state,
        &poll,
        ok(error_package("UNAUTHORIZED", "session expired")),
    );

    assert_eq!(state.session_id, 0);
    assert_eq!(count_logged_out(&state.take_events()), 1);
}

#[test]
fn test_late_answer_after_reset_is_ignored() {
    let mut state = test_state();
    let poll = polling(&mut state, 42, &["A"]);

    // A config push is in flight when the poll fails
    let push = update(&mut state, Message::PushConfig(UserConfig::default()));
    let push_id = record(&mut state, expect_send(&push));
    answer(&mut state, &poll, Outcome::failure(0, "timed out"));
    state.take_events();

    let late = update(
        &mut state,
        Message::Answer {
            id: push_id,
            outcome: Outcome::failure(0, "timed out"),
        },
    );

    assert!(late.action.is_none());
    assert!(state.take_events().is_empty());
}

// ─────────────────────────────────────────────────────────────────
// Config push and logout
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_push_config_requires_session() {
    let mut state = test_state();
    let result = update(&mut state, Message::PushConfig(UserConfig::default()));

    assert!(result.action.is_none());
    let events = state.take_events();
    assert!(matches!(events[0],
        SessionEvent::Diagnostic { level: DiagnosticLevel::Warning, .. }));
}

#[test]
fn test_push_config_becomes_current_config() {
    let mut state = test_state();
    polling(&mut state, 42, &["A"]);

    let mut config = UserConfig::default();
    config.add_to_blacklist(ExchangeId::new("A"), SymbolId::new("X"));
    let result = update(&mut state, Message::PushConfig(config.clone()));

    assert_eq!(
        expect_send(&result),
        Query::PushConfig {
            session_id: 42,
            config: config.clone(),
        }
    );
    assert_eq!(state.user_config, config);
    assert_eq!(state.phase, SessionPhase::Polling);
}

#[test]
fn test_push_config_failure_keeps_session() {
    let mut state = test_state();
    polling(&mut state, 42, &["A"]);

    let push = update(&mut state, Message::PushConfig(UserConfig::default()));
    let result = answer(&mut state, &push, Outcome::failure(503, "unavailable"));

    assert!(result.action.is_none());
    assert_eq!(state.session_id, 42);
    assert_eq!(state.phase, SessionPhase::Polling);

    let events = state.take_events();
    assert_eq!(count_logged_out(&events), 0);
    assert!(events.iter().any(|e| matches!(e,
        SessionEvent::Diagnostic { level: DiagnosticLevel::Warning, message }
            if message.starts_with("Config:"))));
}

#[test]
fn test_push_config_ack_reports_success() {
    let mut state = test_state();
    polling(&mut state, 42, &["A"]);

    let push = update(&mut state, Message::PushConfig(UserConfig::default()));
    let result = answer(&mut state, &push, ok(ack_payload()));

    assert!(result.action.is_none());
    assert!(state.take_events().iter().any(|e| matches!(e,
        SessionEvent::Diagnostic { level: DiagnosticLevel::Info, message }
            if message == "Config: Successfully. Server message: ok")));
}

#[test]
fn test_blacklist_add_pushes_updated_config() {
    let mut state = test_state();
    polling(&mut state, 42, &["A"]);

    let result = update(
        &mut state,
        Message::BlacklistAdd {
            exchange: ExchangeId::new("A"),
            symbol: SymbolId::new("X"),
        },
    );

    let Some(Message::PushConfig(config)) = result.message else {
        panic!("expected PushConfig follow-up");
    };
    assert!(config.is_blacklisted(&ExchangeId::new("A"), &SymbolId::new("X")));

    let push = update(&mut state, Message::PushConfig(config));
    assert!(matches!(expect_send(&push), Query::PushConfig { session_id: 42, .. }));
    assert_eq!(state.user_config.blacklist.len(), 1);

    // Adding the same entry again changes nothing
    let again = update(
        &mut state,
        Message::BlacklistAdd {
            exchange: ExchangeId::new("A"),
            symbol: SymbolId::new("X"),
        },
    );
    assert!(again.message.is_none());
    assert!(again.action.is_none());
}

#[test]
fn test_blacklist_remove_unknown_entry_is_noop() {
    let mut state = test_state();
    polling(&mut state, 42, &["A"]);

    let result = update(
        &mut state,
        Message::BlacklistRemove {
            exchange: ExchangeId::new("A"),
            symbol: SymbolId::new("X"),
        },
    );
    assert!(result.message.is_none());
}

#[test]
fn test_logout_success_relogs_in() {
    let mut state = test_state();
    polling(&mut state, 42, &["A"]);

    let logout = update(&mut state, Message::Logout);
    assert_eq!(expect_send(&logout), Query::Logout { session_id: 42 });

    let result = answer(&mut state, &logout, ok(ack_payload()));

    assert!(matches!(expect_send(&result), Query::Login { .. }));
    assert_eq!(state.session_id, 0);
    assert_eq!(state.phase, SessionPhase::LoggingIn);
    assert_eq!(count_logged_out(&state.take_events()), 1);
}

#[test]
fn test_poll_timer_from_previous_session_is_dropped() {
    let mut state = test_state();
    let poll = polling(&mut state, 42, &["A"]);
    let scheduled = answer(&mut state, &poll, ok(detect_payload(vec![])));
    let (_, old_timer) = expect_schedule(&scheduled);

    // Logout, then a new session walks the catalog and starts its own polls
    let logout = update(&mut state, Message::Logout);
    let login = answer(&mut state, &logout, ok(ack_payload()));
    let list = answer(&mut state, &login, ok(login_payload(43)));
    let symbols = answer(&mut state, &list, ok(exchanges_payload(&["A"])));
    let first_poll = answer(&mut state, &symbols, ok(symbols_payload("A", &["X"])));
    record(&mut state, expect_send(&first_poll));
    assert_eq!(state.phase, SessionPhase::Polling);

    let stale = update(&mut state, old_timer);
    assert!(stale.action.is_none());

    let outstanding_polls = state
        .sent
        .ids()
        .into_iter()
        .filter_map(|id| state.sent.remove(id))
        .filter(|sent| sent.kind() == QueryKind::PollDetections)
        .count();
    assert_eq!(outstanding_polls, 1);
}

#[test]
fn test_poll_timer_dropped_when_server_reuses_session_id() {
    let mut state = test_state();
    let poll = polling(&mut state, 42, &["A"]);
    let scheduled = answer(&mut state, &poll, ok(detect_payload(vec![])));
    let (_, old_timer) = expect_schedule(&scheduled);

    let logout = update(&mut state, Message::Logout);
    let login = answer(&mut state, &logout, ok(ack_payload()));
    let list = answer(&mut state, &login, ok(login_payload(42)));
    let symbols = answer(&mut state, &list, ok(exchanges_payload(&["A"])));
    answer(&mut state, &symbols, ok(symbols_payload("A", &["X"])));
    assert_eq!(state.session_id, 42);

    assert!(update(&mut state, old_timer).action.is_none());
}

#[test]
fn test_logout_waits_for_catalog_step() {
    let mut state = test_state();
    let list = logged_in(&mut state, 42);
    let symbols = answer(&mut state, &list, ok(exchanges_payload(&["A", "B"])));
    let symbols_id = record(&mut state, expect_send(&symbols));

    // Held while the symbol list for A is outstanding
    let held = update(&mut state, Message::Logout);
    assert!(held.action.is_none());
    assert!(state.logout_pending);
    assert_eq!(state.phase, SessionPhase::CatalogSymbols);

    // The answer releases the Logout instead of asking for B
    let result = update(
        &mut state,
        Message::Answer {
            id: symbols_id,
            outcome: ok(symbols_payload("A", &["A1"])),
        },
    );
    assert_eq!(expect_send(&result), Query::Logout { session_id: 42 });
    assert_eq!(state.phase, SessionPhase::LoggingOut);
    assert!(!state.logout_pending);

    // A second request while logging out is ignored
    assert!(update(&mut state, Message::Logout).action.is_none());
}

#[test]
fn test_logout_waits_for_outstanding_poll() {
    let mut state = test_state();
    let poll = polling(&mut state, 42, &["A"]);
    let poll_id = record(&mut state, expect_send(&poll));

    assert!(update(&mut state, Message::Logout).action.is_none());

    let result = update(
        &mut state,
        Message::Answer {
            id: poll_id,
            outcome: ok(detect_payload(vec![])),
        },
    );
    assert_eq!(expect_send(&result), Query::Logout { session_id: 42 });
}

#[test]
fn test_logout_not_held_by_config_push() {
    let mut state = test_state();
    polling(&mut state, 42, &["A"]);
    let push = update(&mut state, Message::PushConfig(UserConfig::default()));
    record(&mut state, expect_send(&push));

    let logout = update(&mut state, Message::Logout);
    assert_eq!(expect_send(&logout), Query::Logout { session_id: 42 });
}

#[test]
fn test_poll_timer_dropped_while_logging_out() {
    let mut state = test_state();
    let poll = polling(&mut state, 42, &["A"]);
    let scheduled = answer(&mut state, &poll, ok(detect_payload(vec![])));
    let (_, timer) = expect_schedule(&scheduled);

    update(&mut state, Message::Logout);
    assert!(update(&mut state, timer).action.is_none());
}

#[test]
fn test_logout_failure_is_full_reset() {
    let mut state = test_state();
    polling(&mut state, 42, &["A"]);

    let logout = update(&mut state, Message::Logout);
    let result = answer(&mut state, &logout, ok(error_package("NOT_FOUND", "no session")));

    let (_, message) = expect_schedule(&result);
    assert!(matches!(message, Message::Login));
    assert_eq!(state.session_id, 0);
    assert_eq!(count_logged_out(&state.take_events()), 1);
}

#[test]
fn test_logout_without_session_is_ignored() {
    let mut state = test_state();
    let result = update(&mut state, Message::Logout);
    assert!(result.action.is_none());
}

// ─────────────────────────────────────────────────────────────────
// Misc
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_answer_is_ignored() {
    let mut state = test_state();
    let result = update(
        &mut state,
        Message::Answer {
            id: next_request_id(),
            outcome: ok(ack_payload()),
        },
    );

    assert!(result.action.is_none());
    assert!(state.take_events().is_empty());
}

#[test]
fn test_session_bound_queries_suppressed_without_session() {
    let mut state = test_state();
    assert_eq!(state.session_id, 0);

    let list = send(&state, Query::ListExchanges { session_id: 0 });
    assert!(list.action.is_none());
    let poll = send(&state, Query::PollDetections { session_id: 0 });
    assert!(poll.action.is_none());

    // A query still naming a session that has since been reset
    let stale = send(&state, Query::PollDetections { session_id: 42 });
    assert!(stale.action.is_none());

    let login = send(
        &state,
        Query::Login {
            user: "trader".to_string(),
            password: "secret".to_string(),
        },
    );
    assert!(matches!(expect_send(&login), Query::Login { .. }));

    state.session_id = 42;
    let list = send(&state, Query::ListExchanges { session_id: 42 });
    assert_eq!(expect_send(&list), Query::ListExchanges { session_id: 42 });
}

#[test]
fn test_two_logins_tracked_independently() {
    let mut state = test_state();
    let login = Query::Login {
        user: "trader".to_string(),
        password: "secret".to_string(),
    };
    let a = record(&mut state, login.clone());
    let b = record(&mut state, login);

    assert_ne!(a, b);
    assert_eq!(state.sent.len(), 2);
    assert_eq!(
        state.sent.remove(a).map(|s| s.kind()),
        Some(QueryKind::Login)
    );
    assert!(state.sent.contains(b));
}

#[test]
fn test_quit_sets_flag() {
    let mut state = test_state();
    update(&mut state, Message::Quit);
    assert!(state.should_quit());
}
