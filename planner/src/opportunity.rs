//! Stage 1 — opportunity calculators (§4.4).
//!
//! Each calculator scans the planning context for one category of
//! opportunity and emits [`ActionCandidate`]s tagged to that category,
//! ranked by priority descending and bounded to
//! `max_opportunities_per_category`.

use crate::context::PlanningContext;
use crate::registry::{ModuleConfig, ModuleSettings};
use glidepath_core::plan::ActionCandidate;
use glidepath_core::security::Isin;
use glidepath_core::trade::Side;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub const PROFIT_TAKING: &str = "profit_taking";
pub const AVERAGING_DOWN: &str = "averaging_down";
pub const OPPORTUNITY_BUYS: &str = "opportunity_buys";
pub const REBALANCE_SELLS: &str = "rebalance_sells";
pub const REBALANCE_BUYS: &str = "rebalance_buys";
pub const WEIGHT_BASED: &str = "weight_based";

pub const KNOWN_CALCULATORS: &[&str] = &[
    PROFIT_TAKING,
    AVERAGING_DOWN,
    OPPORTUNITY_BUYS,
    REBALANCE_SELLS,
    REBALANCE_BUYS,
    WEIGHT_BASED,
];

const DEFAULT_MAX_PER_CATEGORY: usize = 10;

fn rank_and_bound(mut candidates: Vec<ActionCandidate>, max: usize) -> Vec<ActionCandidate> {
    candidates.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.isin.cmp(&b.isin))
    });
    candidates.truncate(max);
    candidates
}

fn candidate(
    side: Side,
    isin: &Isin,
    quantity: Decimal,
    price_eur: Decimal,
    priority: f64,
    reason: impl Into<String>,
    tag: &str,
) -> ActionCandidate {
    ActionCandidate {
        side,
        isin: isin.clone(),
        quantity,
        price: price_eur,
        value_eur: quantity * price_eur,
        currency: glidepath_core::Currency::eur(),
        priority: priority.clamp(0.0, 1.0),
        reason: reason.into(),
        tags: vec![tag.to_string()],
    }
}

/// `profit_taking`: position unrealized gain ≥ `gain_threshold` (default
/// 0.20), sells the held fraction `sell_fraction` (default `1.0`, i.e. the
/// whole position).
fn profit_taking(ctx: &PlanningContext, settings: &ModuleSettings) -> Vec<ActionCandidate> {
    let threshold = settings.param_f64("gain_threshold", 0.20);
    let sell_fraction =
        Decimal::try_from(settings.param_f64("sell_fraction", 1.0)).unwrap_or(Decimal::ONE);
    let max = settings.param_usize("max_opportunities", DEFAULT_MAX_PER_CATEGORY);

    let mut candidates = Vec::new();
    for position in ctx.positions {
        let Some(security) = ctx.security(&position.isin) else {
            continue;
        };
        if !security.allow_sell || position.quantity.is_zero() {
            continue;
        }
        let Some(gain) = ctx.unrealized_gain_pct(&position.isin) else {
            continue;
        };
        if gain < threshold {
            continue;
        }
        let quantity = (position.quantity * sell_fraction).min(position.quantity);
        if quantity.is_zero() {
            continue;
        }
        let price_eur = if position.quantity.is_zero() {
            Decimal::ZERO
        } else {
            position.market_value_eur / position.quantity
        };
        let priority = (gain / 0.50).clamp(0.0, 1.0);
        candidates.push(candidate(
            Side::Sell,
            &position.isin,
            quantity,
            price_eur,
            priority,
            format!("unrealized gain {:.1}% exceeds profit-taking threshold", gain * 100.0),
            PROFIT_TAKING,
        ));
    }
    rank_and_bound(candidates, max)
}

/// `averaging_down`: position unrealized loss ≥ `loss_threshold` (default
/// 0.20), security still eligible to buy. Adds a fixed `increment_eur`
/// (default €500) worth of additional quantity.
fn averaging_down(ctx: &PlanningContext, settings: &ModuleSettings) -> Vec<ActionCandidate> {
    let threshold = settings.param_f64("loss_threshold", 0.20);
    let increment_eur =
        Decimal::try_from(settings.param_f64("increment_eur", 500.0)).unwrap_or(Decimal::new(500, 0));
    let max = settings.param_usize("max_opportunities", DEFAULT_MAX_PER_CATEGORY);

    let mut candidates = Vec::new();
    for position in ctx.positions {
        let Some(security) = ctx.security(&position.isin) else {
            continue;
        };
        if !security.allow_buy || position.quantity.is_zero() {
            continue;
        }
        let Some(gain) = ctx.unrealized_gain_pct(&position.isin) else {
            continue;
        };
        if gain > -threshold {
            continue;
        }
        let price_eur = if position.quantity.is_zero() {
            security.target_price_eur
        } else {
            position.market_value_eur / position.quantity
        };
        if price_eur.is_zero() {
            continue;
        }
        let quantity = (increment_eur / price_eur).max(Decimal::ZERO);
        if quantity.is_zero() {
            continue;
        }
        let priority = ((-gain) / 0.50).clamp(0.0, 1.0);
        candidates.push(candidate(
            Side::Buy,
            &position.isin,
            quantity,
            price_eur,
            priority,
            format!("unrealized loss {:.1}% eligible for averaging down", gain * 100.0),
            AVERAGING_DOWN,
        ));
    }
    rank_and_bound(candidates, max)
}

/// `opportunity_buys`: security not held, score above `score_threshold`
/// (default 0.70), sized to `budget_eur` (default €1000) if the universe
/// still allows buying it.
fn opportunity_buys(ctx: &PlanningContext, settings: &ModuleSettings) -> Vec<ActionCandidate> {
    let score_threshold = settings.param_f64("score_threshold", 0.70);
    let budget_eur =
        Decimal::try_from(settings.param_f64("budget_eur", 1000.0)).unwrap_or(Decimal::new(1000, 0));
    let max = settings.param_usize("max_opportunities", DEFAULT_MAX_PER_CATEGORY);

    let mut candidates = Vec::new();
    for security in ctx.securities {
        if security.deleted || !security.allow_buy || ctx.is_held(&security.isin) {
            continue;
        }
        let score = ctx.score(&security.isin);
        if score < score_threshold {
            continue;
        }
        if security.target_price_eur.is_zero() {
            continue;
        }
        let quantity = (budget_eur / security.target_price_eur).max(Decimal::ZERO);
        if quantity.is_zero() {
            continue;
        }
        candidates.push(candidate(
            Side::Buy,
            &security.isin,
            quantity,
            security.target_price_eur,
            score,
            format!("not held, score {score:.2} exceeds opportunity threshold"),
            OPPORTUNITY_BUYS,
        ));
    }
    rank_and_bound(candidates, max)
}

/// Shared gap-to-target sizing used by `rebalance_sells`/`rebalance_buys`/
/// `weight_based`: the EUR value to move to close the drift, converted to
/// quantity at `target_price_eur`.
fn weight_gap_candidate(ctx: &PlanningContext, isin: &Isin, tag: &str) -> Option<ActionCandidate> {
    let security = ctx.security(isin)?;
    let gap = ctx.weight_gap(isin);
    if gap.abs() < 1e-9 {
        return None;
    }
    let gap_value_eur = Decimal::try_from(gap.abs()).ok()? * ctx.total_value_eur;
    if security.target_price_eur.is_zero() {
        return None;
    }
    let quantity = (gap_value_eur / security.target_price_eur).max(Decimal::ZERO);
    if quantity.is_zero() {
        return None;
    }
    let priority = gap.abs().clamp(0.0, 1.0);
    if gap > 0.0 {
        if !security.allow_sell {
            return None;
        }
        let held = ctx.held_quantity(isin);
        let quantity = quantity.min(held);
        if quantity.is_zero() {
            return None;
        }
        Some(candidate(
            Side::Sell,
            isin,
            quantity,
            security.target_price_eur,
            priority,
            format!("current weight exceeds target by {:.2} pts", gap * 100.0),
            tag,
        ))
    } else {
        if !security.allow_buy {
            return None;
        }
        Some(candidate(
            Side::Buy,
            isin,
            quantity,
            security.target_price_eur,
            priority,
            format!("current weight trails target by {:.2} pts", -gap * 100.0),
            tag,
        ))
    }
}

/// `rebalance_sells`: current weight exceeds target plus `drift_tolerance`
/// (default 0.03).
fn rebalance_sells(ctx: &PlanningContext, settings: &ModuleSettings) -> Vec<ActionCandidate> {
    let tolerance = settings.param_f64("drift_tolerance", 0.03);
    let max = settings.param_usize("max_opportunities", DEFAULT_MAX_PER_CATEGORY);
    let mut candidates = Vec::new();
    for isin in all_known_isins(ctx) {
        if ctx.weight_gap(&isin) <= tolerance {
            continue;
        }
        if let Some(candidate) = weight_gap_candidate(ctx, &isin, REBALANCE_SELLS) {
            candidates.push(candidate);
        }
    }
    rank_and_bound(candidates, max)
}

/// `rebalance_buys`: current weight trails target by more than
/// `drift_tolerance` (default 0.03).
fn rebalance_buys(ctx: &PlanningContext, settings: &ModuleSettings) -> Vec<ActionCandidate> {
    let tolerance = settings.param_f64("drift_tolerance", 0.03);
    let max = settings.param_usize("max_opportunities", DEFAULT_MAX_PER_CATEGORY);
    let mut candidates = Vec::new();
    for isin in all_known_isins(ctx) {
        if ctx.weight_gap(&isin) >= -tolerance {
            continue;
        }
        if let Some(candidate) = weight_gap_candidate(ctx, &isin, REBALANCE_BUYS) {
            candidates.push(candidate);
        }
    }
    rank_and_bound(candidates, max)
}

/// `weight_based`: any security whose gap from target exceeds
/// `drift_threshold` (default 0.05, deliberately distinct from the
/// rebalance calculators' own tolerance — a wider, independent sweep).
fn weight_based(ctx: &PlanningContext, settings: &ModuleSettings) -> Vec<ActionCandidate> {
    let threshold = settings.param_f64("drift_threshold", 0.05);
    let max = settings.param_usize("max_opportunities", DEFAULT_MAX_PER_CATEGORY);
    let mut candidates = Vec::new();
    for isin in all_known_isins(ctx) {
        if ctx.weight_gap(&isin).abs() <= threshold {
            continue;
        }
        if let Some(candidate) = weight_gap_candidate(ctx, &isin, WEIGHT_BASED) {
            candidates.push(candidate);
        }
    }
    rank_and_bound(candidates, max)
}

fn all_known_isins(ctx: &PlanningContext) -> Vec<Isin> {
    let mut isins: Vec<Isin> = ctx.securities.iter().map(|s| s.isin.clone()).collect();
    isins.sort();
    isins.dedup();
    isins
}

/// Runs every enabled, known calculator and returns the categorized pool,
/// keyed by tag name for the pattern generators to consume.
pub fn run_enabled(
    ctx: &PlanningContext,
    config: &ModuleConfig,
) -> BTreeMap<&'static str, Vec<ActionCandidate>> {
    let mut pool = BTreeMap::new();
    for name in config.enabled_names(KNOWN_CALCULATORS) {
        let settings = config.settings(name);
        let candidates = match name {
            PROFIT_TAKING => profit_taking(ctx, &settings),
            AVERAGING_DOWN => averaging_down(ctx, &settings),
            OPPORTUNITY_BUYS => opportunity_buys(ctx, &settings),
            REBALANCE_SELLS => rebalance_sells(ctx, &settings),
            REBALANCE_BUYS => rebalance_buys(ctx, &settings),
            WEIGHT_BASED => weight_based(ctx, &settings),
            _ => unreachable!("validated against KNOWN_CALCULATORS at config load"),
        };
        // A calculator producing malformed priorities is skipped rather
        // than failing the pipeline (§7 "C4 skips a module if its output
        // fails validation but continues").
        if candidates.iter().any(|c| !(0.0..=1.0).contains(&c.priority)) {
            tracing::warn!(calculator = name, "skipping calculator with out-of-range priority");
            continue;
        }
        if !candidates.is_empty() {
            pool.insert(name, candidates);
        }
    }
    pool
}

pub(crate) fn all_candidates(pool: &BTreeMap<&'static str, Vec<ActionCandidate>>) -> Vec<ActionCandidate> {
    pool.values().flatten().cloned().collect()
}

pub(crate) fn category(pool: &BTreeMap<&'static str, Vec<ActionCandidate>>, name: &str) -> Vec<ActionCandidate> {
    pool.get(name).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlanningContext;
    use chrono::Utc;
    use glidepath_core::bucket::BucketId;
    use glidepath_core::security::Security;
    use glidepath_core::weights::{FallbackStrategy, TargetWeights};
    use glidepath_core::Currency;
    use indexmap::IndexMap;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn security(isin: &str, target_price: Decimal) -> Security {
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
            target_price,
            false,
        )
    }

    fn position(isin: &str, quantity: Decimal, avg_price: Decimal, market_value_eur: Decimal) -> glidepath_core::position::Position {
        glidepath_core::position::Position::new(
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
    fn profit_taking_flags_positions_above_gain_threshold() {
        let positions = vec![position("A", dec!(10), dec!(90), dec!(1100))];
        let securities = vec![security("A", dec!(100))];
        let target = empty_target();
        let last_traded = HashMap::new();
        let scores = HashMap::new();
        let ctx = PlanningContext {
            securities: &securities,
            positions: &positions,
            target_weights: &target,
            total_value_eur: dec!(1100),
            regime: glidepath_core::regime::Regime::Neutral,
            now: Utc::now(),
            last_traded_at: &last_traded,
            scores: &scores,
        };
        let settings = ModuleSettings::enabled(serde_json::json!({"gain_threshold": 0.10}));
        let result = profit_taking(&ctx, &settings);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].side, Side::Sell);
    }

    #[test]
    fn opportunity_buys_skips_already_held_securities() {
        let positions = vec![position("A", dec!(10), dec!(90), dec!(1000))];
        let securities = vec![security("A", dec!(100))];
        let target = empty_target();
        let last_traded = HashMap::new();
        let mut scores = HashMap::new();
        scores.insert(Isin::from("A"), 0.9);
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
        assert!(opportunity_buys(&ctx, &settings).is_empty());
    }

    #[test]
    fn rebalance_sells_triggers_when_weight_exceeds_target_plus_tolerance() {
        let positions = vec![position("A", dec!(10), dec!(90), dec!(900))];
        let securities = vec![security("A", dec!(90))];
        let mut weights = IndexMap::new();
        weights.insert(Isin::from("A"), 0.50);
        let target = TargetWeights {
            weights,
            achieved_expected_return: 0.1,
            blend_used: 0.0,
            fallback_used: FallbackStrategy::None,
            attempts: 1,
            highly_correlated: vec![],
        };
        let last_traded = HashMap::new();
        let scores = HashMap::new();
        let ctx = PlanningContext {
            securities: &securities,
            positions: &positions,
            target_weights: &target,
            total_value_eur: dec!(900),
            regime: glidepath_core::regime::Regime::Neutral,
            now: Utc::now(),
            last_traded_at: &last_traded,
            scores: &scores,
        };
        let settings = ModuleSettings::enabled(serde_json::json!({"drift_tolerance": 0.03}));
        let result = rebalance_sells(&ctx, &settings);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].side, Side::Sell);
    }

    #[test]
    fn unknown_calculator_name_is_rejected_at_config_validation() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("bogus".to_string(), ModuleSettings::enabled(serde_json::Value::Null));
        let config = ModuleConfig(map);
        assert!(config.validate_known(KNOWN_CALCULATORS).is_err());
    }
}
