#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Glidepath Planner (C4)
//!
//! Expands `(current portfolio, target weights)` into ranked candidate
//! action sequences through a four-stage pipeline, each stage built from
//! named, independently configurable modules:
//!
//! 1. [`opportunity`] calculators tag individual BUY/SELL candidates by
//!    category.
//! 2. [`pattern`] generators turn the categorized pool into ordered
//!    sequences.
//! 3. [`sequence`] generators expand and re-rank those orderings, capped to
//!    `beam_width`.
//! 4. [`filter`]s drop ineligible actions and low-quality sequences.
//!
//! [`PlanningContext`] is the read-only snapshot every stage shares;
//! [`generate_sequences`] wires the four stages together.

pub mod config;
pub mod context;
pub mod filter;
pub mod opportunity;
pub mod pattern;
pub mod registry;
pub mod sequence;

pub use config::PlannerConfig;
pub use context::PlanningContext;
pub use registry::{ModuleConfig, ModuleSettings, UnknownModule};

use glidepath_core::error::GlidepathError;
use glidepath_core::plan::ActionCandidate;

impl From<UnknownModule> for GlidepathError {
    fn from(value: UnknownModule) -> Self {
        GlidepathError::InvalidInput(value.to_string())
    }
}

/// Validates all four stage configs against their known-name lists, then
/// runs the full opportunity → pattern → sequence → filter pipeline.
///
/// Output is deterministic: within any tie the ordering rule is descending
/// priority / rough-pre-score, lexicographic-by-ISIN last.
pub fn generate_sequences(
    ctx: &PlanningContext<'_>,
    config: &PlannerConfig,
) -> Result<Vec<Vec<ActionCandidate>>, GlidepathError> {
    config
        .opportunity_calculators
        .validate_known(opportunity::KNOWN_CALCULATORS)?;
    config.pattern_generators.validate_known(pattern::KNOWN_PATTERNS)?;
    config
        .sequence_generators
        .validate_known(sequence::KNOWN_GENERATORS)?;
    config.filters.validate_known(filter::KNOWN_FILTERS)?;

    let opportunities = opportunity::run_enabled(ctx, &config.opportunity_calculators);
    tracing::debug!(
        categories = opportunities.len(),
        total = opportunity::all_candidates(&opportunities).len(),
        "stage 1: opportunity calculators complete"
    );

    let patterned = pattern::run_enabled(ctx, &opportunities, &config.pattern_generators);
    tracing::debug!(sequences = patterned.len(), "stage 2: pattern generators complete");

    let expanded = sequence::run_enabled(patterned, &config.sequence_generators, config.beam_width);
    tracing::debug!(sequences = expanded.len(), "stage 3: sequence generators complete");

    let filtered = filter::run_enabled(ctx, expanded, &config.filters);
    tracing::debug!(sequences = filtered.len(), "stage 4: filters complete");

    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use glidepath_core::bucket::BucketId;
    use glidepath_core::position::Position;
    use glidepath_core::security::{Isin, Security};
    use glidepath_core::weights::{FallbackStrategy, TargetWeights};
    use glidepath_core::Currency;
    use indexmap::IndexMap;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    fn security(isin: &str) -> Security {
        Security::new(
            Isin::from(isin),
            isin.to_string(),
            "IE".to_string(),
            "diversified".to_string(),
            Currency::eur(),
            0.0,
            0.5,
            true,
            true,
            Decimal::ONE,
            1.0,
            dec!(100),
            false,
        )
    }

    fn position(isin: &str, quantity: Decimal, avg_price: Decimal, market_value_eur: Decimal) -> Position {
        Position::new(
            Isin::from(isin),
            quantity,
            avg_price,
            Currency::eur(),
            dec!(1),
            market_value_eur,
            BucketId::core(),
            Utc::now(),
            None,
        )
    }

    fn default_config() -> PlannerConfig {
        let mut opportunity_calculators = BTreeMap::new();
        for name in opportunity::KNOWN_CALCULATORS {
            opportunity_calculators.insert(name.to_string(), ModuleSettings::enabled(serde_json::Value::Null));
        }
        let mut pattern_generators = BTreeMap::new();
        pattern_generators.insert(
            pattern::REBALANCE.to_string(),
            ModuleSettings::enabled(serde_json::Value::Null),
        );
        pattern_generators.insert(
            pattern::OPPORTUNITY_FIRST.to_string(),
            ModuleSettings::enabled(serde_json::Value::Null),
        );
        let mut sequence_generators = BTreeMap::new();
        sequence_generators.insert(
            sequence::CONSTRAINT_RELAXATION.to_string(),
            ModuleSettings::enabled(serde_json::Value::Null),
        );
        let mut filters = BTreeMap::new();
        filters.insert(filter::ELIGIBILITY.to_string(), ModuleSettings::enabled(serde_json::Value::Null));
        filters.insert(filter::DIVERSITY.to_string(), ModuleSettings::enabled(json!({"min_diversity_score": 0.0})));

        PlannerConfig {
            opportunity_calculators: ModuleConfig(opportunity_calculators),
            pattern_generators: ModuleConfig(pattern_generators),
            sequence_generators: ModuleConfig(sequence_generators),
            filters: ModuleConfig(filters),
            beam_width: Some(20),
        }
    }

    #[test]
    fn full_pipeline_produces_sequences_for_a_drifted_portfolio() {
        let positions = vec![position("A", dec!(10), dec!(90), dec!(1200))];
        let securities = vec![security("A"), security("B")];
        let mut weights = IndexMap::new();
        weights.insert(Isin::from("A"), 0.5);
        weights.insert(Isin::from("B"), 0.5);
        let target = TargetWeights {
            weights,
            achieved_expected_return: 0.08,
            blend_used: 0.0,
            fallback_used: FallbackStrategy::EfficientReturn,
            attempts: 1,
            highly_correlated: vec![],
        };
        let last_traded = HashMap::new();
        let scores = HashMap::new();
        let ctx = PlanningContext {
            securities: &securities,
            positions: &positions,
            target_weights: &target,
            total_value_eur: dec!(1200),
            regime: glidepath_core::regime::Regime::Neutral,
            now: Utc::now(),
            last_traded_at: &last_traded,
            scores: &scores,
        };
        let config = default_config();
        let sequences = generate_sequences(&ctx, &config).unwrap();
        assert!(!sequences.is_empty());
        for sequence in &sequences {
            assert!(!sequence.is_empty());
        }
    }

    #[test]
    fn unknown_module_name_fails_the_whole_pipeline() {
        let positions: Vec<Position> = vec![];
        let securities: Vec<Security> = vec![];
        let target = TargetWeights {
            weights: IndexMap::new(),
            achieved_expected_return: 0.0,
            blend_used: 0.0,
            fallback_used: FallbackStrategy::None,
            attempts: 0,
            highly_correlated: vec![],
        };
        let last_traded = HashMap::new();
        let scores = HashMap::new();
        let ctx = PlanningContext {
            securities: &securities,
            positions: &positions,
            target_weights: &target,
            total_value_eur: dec!(0),
            regime: glidepath_core::regime::Regime::Neutral,
            now: Utc::now(),
            last_traded_at: &last_traded,
            scores: &scores,
        };
        let mut config = default_config();
        let mut bogus = BTreeMap::new();
        bogus.insert("not_a_real_calculator".to_string(), ModuleSettings::enabled(serde_json::Value::Null));
        config.opportunity_calculators = ModuleConfig(bogus);
        assert!(generate_sequences(&ctx, &config).is_err());
    }
}
