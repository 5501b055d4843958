//! Supplementary performance metrics, kept alongside the expected-return
//! model for ad-hoc analysis of simulated and executed trade sequences.
//! Not consumed by the core planning cycle; available to callers that want
//! a Sharpe/win-rate/profit-factor view over a `SequenceEvaluation` history.

pub mod profit_factor;
pub mod sharpe;
pub mod win_rate;
