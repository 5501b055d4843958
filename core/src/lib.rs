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
//! # Glidepath Core
//!
//! Shared domain model, error taxonomy and ambient runtime plumbing for the
//! planning-evaluation-optimization pipeline. Downstream crates
//! (`glidepath-ledger`, `glidepath-returns`, `glidepath-optimizer`,
//! `glidepath-planner`, `glidepath-evaluator`, `glidepath-coordinator`) build
//! on the types defined here; none of them own a competing copy.
//!
//! ## Module map
//!
//! - [`security`]: the investable universe (`Security`, ISIN-keyed).
//! - [`position`]: held quantities per security.
//! - [`bucket`]: named sub-portfolios (`core` + satellites) and their settings.
//! - [`trade`]: immutable executed trade records.
//! - [`cashflow`]: external deposit/withdrawal/dividend events.
//! - [`weights`]: the optimizer's output (`TargetWeights`).
//! - [`plan`]: ephemeral planner/evaluator types (`ActionCandidate`,
//!   `SequenceEvaluation`).
//! - [`regime`]: the macro regime label threaded through C2 and C5.
//! - [`hash`]: cache-identity fingerprints (`PortfolioHash`,
//!   `OptimizerSettingsHash`).
//! - [`error`]: the aggregated error taxonomy.
//! - [`logging`] / [`shutdown`]: ambient runtime plumbing.

pub mod bucket;
pub mod cashflow;
pub mod error;
pub mod hash;
pub mod logging;
pub mod plan;
pub mod position;
pub mod regime;
pub mod security;
pub mod shutdown;
pub mod trade;
pub mod weights;

use chrono::{DateTime, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// A timed value, pairing any `T` with the `DateTime<Utc>` it was observed or
/// computed at. Used throughout the pipeline for balances, prices and
/// positions that lag behind real time by up to one sync interval.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Deserialize,
    Serialize,
    Constructor,
)]
pub struct Timed<T> {
    pub value: T,
    pub time: DateTime<Utc>,
}

/// Monotonically increasing sequence number. Used by the outbound event bus
/// (see `glidepath-integration`) so subscribers can detect gaps in
/// best-effort delivery.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct Sequence(pub u64);

impl Sequence {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn fetch_add(&mut self) -> Sequence {
        let sequence = *self;
        self.0 += 1;
        sequence
    }
}

/// An ISO 4217-ish currency code. Kept as a thin newtype (rather than a
/// `String` everywhere) so the FX routing table in `glidepath-ledger` can't
/// silently accept a typo'd code.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Constructor,
)]
pub struct Currency(pub String);

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Currency {
    pub fn eur() -> Self {
        Self("EUR".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Currency {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Test utilities shared across crates. Mirrors the fixture-builder pattern
/// used by downstream crates' own test modules.
#[cfg(any(test, feature = "test-util"))]
pub mod test_utils {
    use crate::Currency;
    use chrono::{DateTime, Days, TimeDelta, Utc};

    pub fn f64_is_eq(actual: f64, expected: f64, epsilon: f64) -> bool {
        if actual.is_nan() && expected.is_nan() {
            true
        } else if actual.is_infinite() && expected.is_infinite() {
            actual.is_sign_positive() == expected.is_sign_positive()
        } else if actual.is_nan()
            || expected.is_nan()
            || actual.is_infinite()
            || expected.is_infinite()
        {
            false
        } else {
            (actual - expected).abs() < epsilon
        }
    }

    pub fn time_plus_days(base: DateTime<Utc>, plus: u64) -> DateTime<Utc> {
        base.checked_add_days(Days::new(plus)).unwrap()
    }

    pub fn time_plus_secs(base: DateTime<Utc>, plus: i64) -> DateTime<Utc> {
        base.checked_add_signed(TimeDelta::seconds(plus)).unwrap()
    }

    pub fn eur() -> Currency {
        Currency::eur()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_fetch_add_returns_previous_value_and_increments() {
        let mut seq = Sequence(5);
        let previous = seq.fetch_add();
        assert_eq!(previous.value(), 5);
        assert_eq!(seq.value(), 6);
    }

    #[test]
    fn currency_display_matches_code() {
        let eur = Currency::from("EUR");
        assert_eq!(eur.to_string(), "EUR");
    }
}
