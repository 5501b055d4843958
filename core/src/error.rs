//! # Core Error Taxonomy
//!
//! Centralizes the error classification from the planning core's error-handling
//! design: semantic ledger failures, evaluator feasibility flags (which are not
//! errors), optimizer fallback notices (also not errors), external-collaborator
//! unavailability, and the coordinator's lock/cancellation signals.
//!
//! Each subsystem crate (`glidepath-ledger`, `glidepath-optimizer`, ...) defines
//! its own focused error enum; [`GlidepathError`] aggregates them into one
//! type so callers that don't care which component failed have a single
//! thing to match on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aggregated error type for the planning core.
///
/// `INFEASIBLE_SEQUENCE` and `OPTIMIZER_FALLBACK` are deliberately absent from
/// this enum: per the error-handling design they are not errors. An
/// infeasible sequence is a `SequenceEvaluation` with `feasible = false`; a
/// fallback strategy is reported via `TargetWeights::fallback_used`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum GlidepathError {
    /// Caller supplied malformed or self-contradictory input. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Ledger: the source bucket/currency balance is below the requested amount.
    #[error("insufficient funds: bucket={bucket} currency={currency} requested={requested} available={available}")]
    InsufficientFunds {
        bucket: String,
        currency: String,
        requested: String,
        available: String,
    },

    /// Ledger: a transfer out of `core` would drop its share below the floor
    /// implied by `1 - satellite_budget_pct`.
    #[error("core floor violated: resulting core share {resulting_core_share} < floor {floor}")]
    CoreFloorViolated {
        resulting_core_share: String,
        floor: String,
    },

    /// Ledger: referenced a bucket that does not exist.
    #[error("unknown bucket: {0}")]
    UnknownBucket(String),

    /// Ledger: an amount that must be non-negative (or strictly positive) was not.
    #[error("negative amount supplied: {0}")]
    NegativeAmount(String),

    /// Ledger: reconciliation discrepancy exceeded tolerance; refuses to mutate.
    #[error("reconciliation discrepancy too large: currency={currency} delta={delta} tolerance={tolerance}")]
    ReconciliationDiscrepancyLarge {
        currency: String,
        delta: String,
        tolerance: String,
    },

    /// Optimizer: dimension mismatch between expected returns and covariance,
    /// or a non positive-semi-definite covariance matrix.
    #[error("optimizer input invalid: {0}")]
    OptimizerInputInvalid(String),

    /// Coordinator: the process-wide planning lock is already held.
    #[error("planning cycle already in progress")]
    Busy,

    /// Coordinator: caller-issued cancellation observed mid-cycle.
    #[error("planning cycle cancelled")]
    Cancelled,

    /// Coordinator: wall-clock deadline elapsed before the cycle finished.
    #[error("planning cycle deadline exceeded")]
    DeadlineExceeded,

    /// Broker adapter unreachable after exhausting the retry budget.
    #[error("broker unavailable: {0}")]
    BrokerUnavailable(String),

    /// Risk-model endpoint (covariance / progressive / HRP) unreachable.
    #[error("risk model unavailable: {0}")]
    RiskModelUnavailable(String),

    /// Market-data endpoint (price / fundamentals) unreachable.
    #[error("market data unavailable: {0}")]
    MarketDataUnavailable(String),

    /// A background task failed to join (panicked or was cancelled).
    #[error("join error: {0}")]
    JoinError(String),

    /// The receiving half of an internal channel was dropped.
    #[error("receiver dropped")]
    RxDropped,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for GlidepathError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::RxDropped
    }
}

impl From<tokio::task::JoinError> for GlidepathError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::JoinError(format!("{value:?}"))
    }
}

/// Outcome of a full planning cycle, surfaced to callers per the
/// error-handling design's "user-visible behavior" section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum CycleOutcome {
    Complete,
    CompleteWithWarnings,
    FallbackUsed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_error_maps_to_rx_dropped() {
        let (tx, rx) = tokio::sync::mpsc::channel::<u8>(1);
        drop(rx);
        let send_err = tx.send(1u8).await.unwrap_err();
        let mapped: GlidepathError = send_err.into();
        assert_eq!(mapped, GlidepathError::RxDropped);
    }

    #[test]
    fn display_messages_are_human_readable() {
        let err = GlidepathError::UnknownBucket("sat9".to_string());
        assert_eq!(err.to_string(), "unknown bucket: sat9");
    }
}
