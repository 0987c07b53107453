//! Application state (Model in TEA pattern)

use std::collections::{BTreeSet, HashMap};

use klinewatch_core::{ExchangeId, SessionEvent, UserConfig};
use klinewatch_net::{Query, QueryKind, RequestId, SentQuery, SessionId};

use crate::config::{AccountSettings, Settings, TimingSettings};

/// Where the session is in its login / catalog / poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session; a Login is scheduled or about to be sent
    #[default]
    LoggedOut,
    /// Login sent, waiting for its answer
    LoggingIn,
    /// Session open, exchange list requested
    CatalogExchanges,
    /// Fetching the symbol list of each pending exchange, one at a time
    CatalogSymbols,
    /// Catalog drained; detection polls are running
    Polling,
    /// The server reported no exchanges; nothing further is requested
    EmptyCatalog,
    /// Logout sent; a fresh login follows its answer
    LoggingOut,
}

/// Queries that were sent and have not been answered yet
#[derive(Debug, Default)]
pub struct SentQueries {
    by_id: HashMap<RequestId, SentQuery>,
}

impl SentQueries {
    pub fn insert(&mut self, id: RequestId, query: Query) {
        self.by_id.insert(id, SentQuery::new(id, query));
    }

    pub fn remove(&mut self, id: RequestId) -> Option<SentQuery> {
        self.by_id.remove(&id)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Outstanding ids, oldest first
    pub fn ids(&self) -> Vec<RequestId> {
        let mut ids: Vec<RequestId> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Whether a login/catalog/poll/logout request is awaiting its answer.
    /// Config pushes run beside the sequence and do not count.
    pub fn has_sequence_request(&self) -> bool {
        self.by_id
            .values()
            .any(|sent| sent.kind() != QueryKind::PushConfig)
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
    }
}

/// Complete application state
#[derive(Debug)]
pub struct AppState {
    pub phase: SessionPhase,

    /// Server-assigned session id; 0 while logged out
    pub session_id: SessionId,

    /// Filter/black-list config of the current session
    pub user_config: UserConfig,

    /// Exchanges whose symbol lists are still to be fetched
    pub pending_exchanges: BTreeSet<ExchangeId>,

    pub sent: SentQueries,

    /// Bumped on every reset. Scheduled polls carry the epoch that
    /// scheduled them and are dropped once it is stale.
    pub epoch: u64,

    /// Logout requested while a sequence step was in flight
    pub logout_pending: bool,

    pub account: AccountSettings,

    pub timing: TimingSettings,

    /// Events produced by the last update, drained by the engine
    events: Vec<SessionEvent>,

    quitting: bool,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            phase: SessionPhase::LoggedOut,
            session_id: 0,
            user_config: UserConfig::default(),
            pending_exchanges: BTreeSet::new(),
            sent: SentQueries::default(),
            epoch: 0,
            logout_pending: false,
            account: settings.account.clone(),
            timing: settings.timing.clone(),
            events: Vec::new(),
            quitting: false,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session_id != 0
    }

    /// Forget the session: id, pending exchanges and every outstanding query.
    ///
    /// Answers to queries sent before the reset are ignored when they arrive.
    pub fn reset_session(&mut self) {
        self.session_id = 0;
        self.pending_exchanges.clear();
        self.sent.clear();
        self.logout_pending = false;
        self.epoch += 1;
        self.phase = SessionPhase::LoggedOut;
    }

    pub fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn request_quit(&mut self) {
        self.quitting = true;
    }

    pub fn should_quit(&self) -> bool {
        self.quitting
    }
}
