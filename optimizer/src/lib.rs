//! # Optimizer — component C3
//!
//! Progressive mean-variance allocation with a hierarchical-risk-parity
//! terminal fallback.
//!
//! ## Main objectives
//!
//! - **Feasibility first**: never raise from an infeasible target; fall
//!   through a strategy chain until HRP, which is always feasible.
//! - **Determinism**: the same `(μ, Σ, bounds, λ)` input always reproduces
//!   the same [`TargetWeights`] so it can be cached on
//!   `(portfolio_hash, optimizer_settings_hash)`.
//! - **Transparency**: report which strategy fired (`fallback_used`), how
//!   many were attempted (`attempts`), and which securities are dangerously
//!   correlated (`highly_correlated`).
//!
//! ## Pipeline
//!
//! ```text
//! efficient_return(r*)
//!   -> relaxed group constraints
//!   -> dropped group constraints
//!   -> efficient_risk(sigma_cap)
//!   -> max_sharpe()
//!   -> min_volatility()
//!   -> HRP (always feasible)
//! ```
//!
//! Blending with HRP (`λ ∈ [0,1]`) runs on top of whichever mean-variance
//! strategy succeeded. See [`progressive::optimize`] for the entry point.

pub mod bounds;
pub mod correlation;
pub mod hrp;
pub mod linalg;
pub mod mean_variance;
pub mod progressive;

pub use bounds::{Bounds, GroupConstraint};
pub use progressive::{optimize, OptimizerInputs};
