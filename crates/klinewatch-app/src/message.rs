//! Message types for the application (TEA pattern)

use klinewatch_core::{ExchangeId, SymbolId, UserConfig};
use klinewatch_net::{Outcome, RequestId};

/// All possible messages/actions in the application
#[derive(Debug, Clone)]
pub enum Message {
    /// Collect finished requests and drop expired outcomes
    Tick,

    /// Outcome of a sent request, collected by a tick
    Answer { id: RequestId, outcome: Outcome },

    /// Open a session (startup and every retry)
    Login,

    /// Ask the server for detections (scheduled after each poll).
    /// `epoch` is the session epoch that scheduled it.
    PollDetections { epoch: u64 },

    /// Store a new filter/black-list config on the server
    PushConfig(UserConfig),

    /// Add a symbol to the black list and push the resulting config
    BlacklistAdd {
        exchange: ExchangeId,
        symbol: SymbolId,
    },

    /// Remove a symbol from the black list and push the resulting config
    BlacklistRemove {
        exchange: ExchangeId,
        symbol: SymbolId,
    },

    /// Close the session; a fresh login follows. Held back while a
    /// sequence step is in flight.
    Logout,

    /// Stop the engine
    Quit,
}
