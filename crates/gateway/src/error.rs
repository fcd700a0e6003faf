//! Gateway error model.

use thiserror::Error;

/// A failed request against the remote store.
///
/// Every failure is terminal for the request that produced it; callers
/// surface it and do not retry. An empty result set is not an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("gateway error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode gateway response: {0}")]
    Decode(String),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// A change subscription could not deliver the next event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The subscriber fell behind and `0` notifications were dropped.
    #[error("change feed lagged; {0} notifications dropped")]
    Lagged(u64),

    /// The feed was shut down; no further events will arrive.
    #[error("change feed closed")]
    Closed,
}
