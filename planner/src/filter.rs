//! Stage 4 — filters (§4.4).
//!
//! Each filter either drops individual actions from a sequence (and the
//! whole sequence if that empties it) or drops the sequence outright.
//! Filters run after sequence generation and before the sequences reach C5.

use crate::context::PlanningContext;
use crate::registry::{ModuleConfig, ModuleSettings};
use glidepath_core::plan::ActionCandidate;
use std::collections::HashSet;

pub const ELIGIBILITY: &str = "eligibility";
pub const RECENTLY_TRADED: &str = "recently_traded";
pub const CORRELATION_AWARE: &str = "correlation_aware";
pub const DIVERSITY: &str = "diversity";

pub const KNOWN_FILTERS: &[&str] = &[ELIGIBILITY, RECENTLY_TRADED, CORRELATION_AWARE, DIVERSITY];

/// `eligibility`: drops actions on non-tradable or inactive securities.
fn eligibility(ctx: &PlanningContext, sequence: &[ActionCandidate], _settings: &ModuleSettings) -> Vec<ActionCandidate> {
    sequence
        .iter()
        .filter(|action| {
            ctx.security(&action.isin).is_some_and(|security| {
                security.is_active()
                    && match action.side {
                        glidepath_core::trade::Side::Buy => security.allow_buy,
                        glidepath_core::trade::Side::Sell => security.allow_sell,
                    }
            })
        })
        .cloned()
        .collect()
}

/// `recently_traded`: drops actions on symbols touched within
/// `cooldown_hours` (default 24).
fn recently_traded(ctx: &PlanningContext, sequence: &[ActionCandidate], settings: &ModuleSettings) -> Vec<ActionCandidate> {
    let cooldown_hours = settings.param_u64("cooldown_hours", 24);
    let cooldown = chrono::Duration::hours(cooldown_hours as i64);
    sequence
        .iter()
        .filter(|action| !ctx.was_recently_traded(&action.isin, cooldown))
        .cloned()
        .collect()
}

/// `correlation_aware`: drops the whole sequence if every action in it
/// lies inside a single highly-correlated cluster (§4.3's `highly_correlated`
/// pairs from the optimizer's output).
fn correlation_aware_keeps(ctx: &PlanningContext, sequence: &[ActionCandidate], _settings: &ModuleSettings) -> bool {
    if sequence.len() < 2 || ctx.target_weights.highly_correlated.is_empty() {
        return true;
    }
    let isins: HashSet<_> = sequence.iter().map(|a| &a.isin).collect();
    let mut cluster: HashSet<_> = HashSet::new();
    for pair in &ctx.target_weights.highly_correlated {
        if isins.contains(&pair.a) && isins.contains(&pair.b) {
            cluster.insert(&pair.a);
            cluster.insert(&pair.b);
        }
    }
    // Every action's ISIN is inside the correlated cluster: the sequence
    // concentrates entirely in one correlated group.
    !(!cluster.is_empty() && isins.iter().all(|isin| cluster.contains(isin)))
}

/// `diversity`: requires `unique_symbols / len(actions) >= min_diversity_score`
/// (default `0.5`).
fn diversity_keeps(sequence: &[ActionCandidate], settings: &ModuleSettings) -> bool {
    if sequence.is_empty() {
        return false;
    }
    let min_score = settings.param_f64("min_diversity_score", 0.5);
    let unique: HashSet<_> = sequence.iter().map(|a| &a.isin).collect();
    (unique.len() as f64 / sequence.len() as f64) >= min_score
}

/// Runs every enabled, known filter over every sequence, dropping actions
/// first, then whole sequences that become empty or fail a sequence-level
/// filter.
pub fn run_enabled(
    ctx: &PlanningContext,
    sequences: Vec<Vec<ActionCandidate>>,
    config: &ModuleConfig,
) -> Vec<Vec<ActionCandidate>> {
    let mut sequences = sequences;

    if config.is_enabled(ELIGIBILITY) {
        let settings = config.settings(ELIGIBILITY);
        sequences = sequences
            .into_iter()
            .map(|sequence| eligibility(ctx, &sequence, &settings))
            .filter(|sequence| !sequence.is_empty())
            .collect();
    }

    if config.is_enabled(RECENTLY_TRADED) {
        let settings = config.settings(RECENTLY_TRADED);
        sequences = sequences
            .into_iter()
            .map(|sequence| recently_traded(ctx, &sequence, &settings))
            .filter(|sequence| !sequence.is_empty())
            .collect();
    }

    if config.is_enabled(CORRELATION_AWARE) {
        let settings = config.settings(CORRELATION_AWARE);
        sequences = sequences
            .into_iter()
            .filter(|sequence| correlation_aware_keeps(ctx, sequence, &settings))
            .collect();
    }

    if config.is_enabled(DIVERSITY) {
        let settings = config.settings(DIVERSITY);
        sequences = sequences
            .into_iter()
            .filter(|sequence| diversity_keeps(sequence, &settings))
            .collect();
    }

    sequences
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use glidepath_core::bucket::BucketId;
    use glidepath_core::position::Position;
    use glidepath_core::security::{Isin, Security};
    use glidepath_core::trade::Side;
    use glidepath_core::weights::{CorrelatedPair, FallbackStrategy, TargetWeights};
    use glidepath_core::Currency;
    use indexmap::IndexMap;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn security(isin: &str, allow_buy: bool, allow_sell: bool) -> Security {
        Security::new(
            Isin::from(isin),
            isin.to_string(),
            "IE".to_string(),
            "diversified".to_string(),
            Currency::eur(),
            0.0,
            0.5,
            allow_buy,
            allow_sell,
            Decimal::ONE,
            1.0,
            dec!(100),
            false,
        )
    }

    fn action(side: Side, isin: &str) -> ActionCandidate {
        ActionCandidate {
            side,
            isin: Isin::from(isin),
            quantity: dec!(1),
            price: dec!(100),
            value_eur: dec!(100),
            currency: Currency::eur(),
            priority: 0.5,
            reason: "test".to_string(),
            tags: vec![],
        }
    }

    fn empty_target() -> TargetWeights {
        TargetWeights {
            weights: IndexMap::new(),
            achieved_expected_return: 0.0,
            blend_used: 0.0,
            fallback_used: FallbackStrategy::None,
            attempts: 0,
            highly_correlated: vec![],
        }
    }

    #[test]
    fn eligibility_drops_actions_on_sell_restricted_securities() {
        let securities = vec![security("A", true, false)];
        let positions: Vec<Position> = vec![];
        let target = empty_target();
        let last_traded = HashMap::new();
        let scores = HashMap::new();
        let ctx = PlanningContext {
            securities: &securities,
            positions: &positions,
            target_weights: &target,
            total_value_eur: dec!(1000),
            regime: glidepath_core::regime::Regime::Neutral,
            now: Utc::now(),
            last_traded_at: &last_traded,
            scores: &scores,
        };
        let settings = ModuleSettings::enabled(serde_json::Value::Null);
        let result = eligibility(&ctx, &[action(Side::Sell, "A")], &settings);
        assert!(result.is_empty());
    }

    #[test]
    fn diversity_rejects_sequences_concentrated_in_one_symbol() {
        let settings = ModuleSettings::enabled(serde_json::Value::Null);
        let sequence = vec![action(Side::Buy, "A"), action(Side::Buy, "A")];
        assert!(!diversity_keeps(&sequence, &settings));
    }

    #[test]
    fn correlation_aware_drops_sequences_entirely_within_one_cluster() {
        let securities = vec![security("A", true, true), security("B", true, true)];
        let positions: Vec<Position> = vec![];
        let mut target = empty_target();
        target.highly_correlated.push(CorrelatedPair {
            a: Isin::from("A"),
            b: Isin::from("B"),
            correlation: 0.9,
        });
        let last_traded = HashMap::new();
        let scores = HashMap::new();
        let ctx = PlanningContext {
            securities: &securities,
            positions: &positions,
            target_weights: &target,
            total_value_eur: dec!(1000),
            regime: glidepath_core::regime::Regime::Neutral,
            now: Utc::now(),
            last_traded_at: &last_traded,
            scores: &scores,
        };
        let sequence = vec![action(Side::Buy, "A"), action(Side::Sell, "B")];
        let settings = ModuleSettings::enabled(serde_json::Value::Null);
        assert!(!correlation_aware_keeps(&ctx, &sequence, &settings));
    }

    #[test]
    fn unknown_filter_name_is_rejected_at_config_validation() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("bogus".to_string(), ModuleSettings::enabled(serde_json::Value::Null));
        let config = ModuleConfig(map);
        assert!(config.validate_known(KNOWN_FILTERS).is_err());
    }
}
