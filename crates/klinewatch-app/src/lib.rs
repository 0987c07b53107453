//! klinewatch-app - Session state machine and orchestration for klinewatch
//!
//! This crate implements the TEA (The Elm Architecture) pattern for the
//! login / catalog / poll session, the Engine that drives it from a tick
//! timer, and configuration loading.

pub mod actions;
pub mod config;
pub mod engine;
pub mod handler;
pub mod message;
pub mod process;
pub mod signals;
pub mod state;

// Re-export primary types
pub use config::Settings;
pub use engine::Engine;
pub use handler::{StepFailure, UpdateAction, UpdateResult};
pub use message::Message;
pub use state::{AppState, SessionPhase};
