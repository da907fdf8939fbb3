//! Crate-wide error and result types.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TrellisError>;

/// Errors produced by the store and the transaction layer.
///
/// Transaction-state errors (`TransactionRequired`, `TransactionOpen`,
/// `NoTransaction`, `WriterBusy`) are kept distinct from data errors so
/// callers can tell a misused transaction protocol apart from a damaged
/// store. A failed operation never leaves the triple indexes divergent.
#[derive(Debug, Error)]
pub enum TrellisError {
    /// A caller-supplied argument or call sequence was rejected.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// An internal invariant was found broken.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// A mutating operation was issued with no open write transaction.
    #[error("transaction required: {0}")]
    TransactionRequired(&'static str),
    /// A transaction is already open where none may be.
    #[error("transaction already open: {0}")]
    TransactionOpen(&'static str),
    /// Commit, abort or end was called with no matching open transaction.
    #[error("no open transaction: {0}")]
    NoTransaction(&'static str),
    /// A write transaction is already active and fail-fast admission was requested.
    #[error("another write transaction is active")]
    WriterBusy,
}
