//! klinewatch Library
//!
//! Headless client for a market-data anomaly detector server.

pub mod headless;

// Re-export main entry point
pub use headless::runner::run_headless;
