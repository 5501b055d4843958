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
//! # Glidepath Returns
//!
//! The return and risk model (component C2): per-security expected returns
//! (regime-, score- and macro-adjusted) and covariance-matrix consumption
//! from the external risk-model endpoint.
//!
//! ## Module map
//!
//! - [`expected_return`]: the CAGR/score/regime/macro blend (§4.2).
//! - [`covariance`]: validation of the `(Σ, symbols)` pair the risk-model
//!   endpoint returns; the core never computes Σ itself.
//! - [`metric`]: supplementary performance metrics (Sharpe, win rate,
//!   profit factor) over simulated or executed trade sequences.
//! - [`time`]: time-interval conventions `metric::sharpe` re-scales against.

pub mod covariance;
pub mod expected_return;
pub mod metric;
pub mod time;
