#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Glidepath Evaluator (C5)
//!
//! Simulates and scores candidate action sequences the plan generator
//! (C4) produces, in parallel over a `rayon` worker pool.
//!
//! ## Module map
//!
//! - [`portfolio`]: the evaluator's working state, `PortfolioContext`.
//! - [`cost`]: the transaction cost model and `min_trade`.
//! - [`simulate`]: the BUY/SELL fold and single-sequence evaluator.
//! - [`score`]: the multi-objective end-state scorer.
//! - [`montecarlo`] / [`stochastic`]: the two scenario-analysis modes.
//! - [`pool`]: the parallel worker pool (`evaluate_batch`/`simulate_batch`).
//! - [`error`]: this crate's error type, wrapped into `GlidepathError`.

pub mod cost;
pub mod error;
pub mod montecarlo;
pub mod pool;
pub mod portfolio;
pub mod score;
pub mod simulate;
pub mod stochastic;

pub use cost::TransactionCostConfig;
pub use error::EvaluatorError;
pub use pool::{default_worker_count, WorkerPool, MAX_BATCH_SIZE};
pub use portfolio::PortfolioContext;
pub use score::{ScoringConfig, ScoringInputs};
pub use simulate::{evaluate_sequence, simulate, DEFAULT_MIN_CURRENCY_RESERVE};
