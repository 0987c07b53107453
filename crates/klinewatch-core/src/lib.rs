//! # klinewatch-core - Core Domain Types
//!
//! Foundation crate for klinewatch. Provides domain types, error handling,
//! session events, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`ExchangeId`], [`SymbolId`] - Catalog identifiers
//! - [`UserConfig`] - Filter and black-list preferences (round-trips unknown fields)
//! - [`Detection`], [`KLine`] - Server-reported anomalies and their price bars
//!
//! ### Events (`events`)
//! - [`SessionEvent`] - Notifications published by the session engine
//! - [`DiagnosticLevel`] - Severity of diagnostic messages
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum; `is_fatal()` marks startup-blocking errors
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use klinewatch_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod prelude;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use events::{DiagnosticLevel, SessionEvent};
pub use types::{BlacklistEntry, Detection, ExchangeId, KLine, KLineFilter, SymbolId, UserConfig};
