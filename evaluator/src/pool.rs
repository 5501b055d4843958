//! Worker pool (§4.5 "Worker pool").
//!
//! Evaluations are stateless over a cloned [`PortfolioContext`], so the pool
//! just fans `par_iter` out over the sequence batch with `rayon` — a CPU-bound
//! numeric simulation workload, unlike the I/O-bound work `tokio` tasks suit.

use crate::cost::TransactionCostConfig;
use crate::error::EvaluatorError;
use crate::portfolio::PortfolioContext;
use crate::score::{ScoringConfig, ScoringInputs};
use crate::simulate::evaluate_sequence;
use chrono::{DateTime, Utc};
use glidepath_core::plan::{ActionCandidate, SequenceEvaluation};
use rayon::prelude::*;
use rust_decimal::Decimal;

/// A single `evaluate_batch`/`simulate_batch` call may contain at most this
/// many sequences.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// CPU count, minimum 2.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2).max(2)
}

#[derive(Debug)]
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, EvaluatorError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
            .map_err(|e| EvaluatorError::PoolBuildFailed(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn with_default_workers() -> Result<Self, EvaluatorError> {
        Self::new(default_worker_count())
    }

    /// Simulates and scores every sequence in `sequences` against a shared
    /// starting `ctx`, in parallel. Each worker clones `ctx` once per
    /// sequence (the simulation fold mutates its own clone, never the
    /// shared start state).
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate_batch(
        &self,
        sequences: &[Vec<ActionCandidate>],
        ctx: &PortfolioContext,
        cost_config: &TransactionCostConfig,
        scoring_config: &ScoringConfig,
        scoring_inputs: &ScoringInputs,
        min_currency_reserve: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Vec<SequenceEvaluation>, EvaluatorError> {
        if sequences.len() > MAX_BATCH_SIZE {
            return Err(EvaluatorError::BatchTooLarge(sequences.len()));
        }
        tracing::debug!(batch_size = sequences.len(), "evaluating sequence batch");
        let results = self.pool.install(|| {
            sequences
                .par_iter()
                .map(|sequence| {
                    evaluate_sequence(ctx, sequence, cost_config, scoring_config, scoring_inputs, min_currency_reserve, now)
                })
                .collect()
        });
        Ok(results)
    }

    /// Like [`Self::evaluate_batch`] but returns the raw end states instead
    /// of scored evaluations, for callers that want to inspect the
    /// post-trade portfolio directly (e.g. a what-if preview).
    pub fn simulate_batch(
        &self,
        sequences: &[Vec<ActionCandidate>],
        ctx: &PortfolioContext,
        cost_config: &TransactionCostConfig,
        min_currency_reserve: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Vec<PortfolioContext>, EvaluatorError> {
        if sequences.len() > MAX_BATCH_SIZE {
            return Err(EvaluatorError::BatchTooLarge(sequences.len()));
        }
        let results = self.pool.install(|| {
            sequences
                .par_iter()
                .map(|sequence| crate::simulate::simulate(ctx, sequence, cost_config, min_currency_reserve, now).0)
                .collect()
        });
        Ok(results)
    }
}
