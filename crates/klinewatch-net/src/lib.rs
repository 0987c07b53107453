//! # klinewatch-net - Request Correlation and Transport
//!
//! Turns a fire-and-forget GET primitive into identifiable requests whose
//! outcomes can be collected later, and defines the detector server's
//! request and answer formats.
//!
//! Depends on [`klinewatch_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Queries
//! - [`Query`], [`QueryKind`] - Typed request descriptors and their kinds
//! - [`SentQuery`] - A query tagged with the id it was sent under
//! - [`next_request_id()`] - Process-wide request id allocation
//!
//! ### Correlation
//! - [`Transport`] - Sends queries, parks outcomes, polls them back
//! - [`ResultStore`] - Lock-protected success/failure maps with retention
//! - [`Outcome`] - Success payload or failure descriptor
//! - [`Fetch`] - Network primitive; [`HttpFetcher`] is the `reqwest` one
//!
//! ### Protocol
//! - [`parse_answer()`] - Decode a server package into typed data
//! - [`AnswerError`] - Package / status / data failures

pub mod http;
pub mod protocol;
pub mod query;
pub mod results;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod transport;

pub use http::HttpFetcher;
pub use protocol::{
    parse_answer, AckAnswer, AnswerError, DetectAnswer, KLinesIdListAnswer, LoginAnswer,
    StatusCode, StockExchangesAnswer,
};
pub use query::{next_request_id, Query, QueryKind, RequestId, SentQuery, SessionId};
pub use results::{Outcome, ResultStore, DEFAULT_RETENTION};
pub use transport::{Fetch, FetchFailure, FetchResult, LocalFetch, Transport};
