//! Evaluator-local error type, wrapped into [`glidepath_core::error::GlidepathError`]
//! at the crate boundary the way every subsystem error enum is (see core's
//! error-taxonomy module doc).

use glidepath_core::error::GlidepathError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluatorError {
    /// A single `evaluate_batch`/`simulate_batch` call exceeded the 10,000
    /// sequence hard limit (§4.5 "Worker pool").
    #[error("batch of {0} sequences exceeds the 10,000 hard limit")]
    BatchTooLarge(usize),

    /// `rayon::ThreadPoolBuilder::build` failed (e.g. an invalid worker
    /// count on a platform with no usable thread API).
    #[error("failed to build evaluator worker pool: {0}")]
    PoolBuildFailed(String),
}

impl From<EvaluatorError> for GlidepathError {
    fn from(value: EvaluatorError) -> Self {
        GlidepathError::InvalidInput(value.to_string())
    }
}
