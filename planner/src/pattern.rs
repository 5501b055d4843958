//! Stage 2 — pattern generators (§4.4).
//!
//! Each pattern is a pure function of the categorized opportunity pool plus
//! its own parameter bag; it produces zero or more ordered
//! [`ActionCandidate`] sequences. Patterns don't see each other's output —
//! diversity across patterns, not composition between them, is the point.

use crate::context::PlanningContext;
use crate::opportunity::{
    self, AVERAGING_DOWN, OPPORTUNITY_BUYS, PROFIT_TAKING, REBALANCE_BUYS, REBALANCE_SELLS,
    WEIGHT_BASED,
};
use crate::registry::{ModuleConfig, ModuleSettings};
use glidepath_core::plan::ActionCandidate;
use glidepath_core::regime::Regime;
use glidepath_core::trade::Side;
use std::collections::BTreeMap;

pub const DIRECT_BUY: &str = "direct_buy";
pub const PROFIT_TAKING_PATTERN: &str = "profit_taking";
pub const REBALANCE: &str = "rebalance";
pub const AVERAGING_DOWN_PATTERN: &str = "averaging_down";
pub const SINGLE_BEST: &str = "single_best";
pub const MULTI_SELL: &str = "multi_sell";
pub const MIXED_STRATEGY: &str = "mixed_strategy";
pub const OPPORTUNITY_FIRST: &str = "opportunity_first";
pub const DEEP_REBALANCE: &str = "deep_rebalance";
pub const CASH_GENERATION: &str = "cash_generation";
pub const COST_OPTIMIZED: &str = "cost_optimized";
pub const ADAPTIVE: &str = "adaptive";
pub const MARKET_REGIME: &str = "market_regime";

pub const KNOWN_PATTERNS: &[&str] = &[
    DIRECT_BUY,
    PROFIT_TAKING_PATTERN,
    REBALANCE,
    AVERAGING_DOWN_PATTERN,
    SINGLE_BEST,
    MULTI_SELL,
    MIXED_STRATEGY,
    OPPORTUNITY_FIRST,
    DEEP_REBALANCE,
    CASH_GENERATION,
    COST_OPTIMIZED,
    ADAPTIVE,
    MARKET_REGIME,
];

type Pool<'a> = &'a BTreeMap<&'static str, Vec<ActionCandidate>>;

fn by_priority_desc(mut actions: Vec<ActionCandidate>) -> Vec<ActionCandidate> {
    actions.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.isin.cmp(&b.isin))
    });
    actions
}

fn take(actions: Vec<ActionCandidate>, n: usize) -> Vec<ActionCandidate> {
    let mut actions = actions;
    actions.truncate(n);
    actions
}

/// `direct_buy`: the single highest-priority opportunity buy, alone.
fn direct_buy(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let n = settings.param_usize("top_n", 1);
    let buys = by_priority_desc(opportunity::category(pool, OPPORTUNITY_BUYS));
    take(buys, n)
        .into_iter()
        .map(|action| vec![action])
        .collect()
}

/// `profit_taking`: every profit-taking sell, one sequence.
fn profit_taking(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let max = settings.param_usize("max_actions", 5);
    let sells = by_priority_desc(opportunity::category(pool, PROFIT_TAKING));
    let sequence = take(sells, max);
    if sequence.is_empty() {
        vec![]
    } else {
        vec![sequence]
    }
}

/// `rebalance`: sells before buys, both drawn from the rebalance
/// calculators, capped by `max_actions`.
fn rebalance(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let max = settings.param_usize("max_actions", 10);
    let mut sells = by_priority_desc(opportunity::category(pool, REBALANCE_SELLS));
    let buys = by_priority_desc(opportunity::category(pool, REBALANCE_BUYS));
    sells.extend(buys);
    let sequence = take(sells, max);
    if sequence.is_empty() {
        vec![]
    } else {
        vec![sequence]
    }
}

/// `averaging_down`: every averaging-down buy, one sequence.
fn averaging_down(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let max = settings.param_usize("max_actions", 5);
    let buys = by_priority_desc(opportunity::category(pool, AVERAGING_DOWN));
    let sequence = take(buys, max);
    if sequence.is_empty() {
        vec![]
    } else {
        vec![sequence]
    }
}

/// `single_best`: the single highest-priority action across the whole pool,
/// regardless of category.
fn single_best(pool: Pool, _settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let all = by_priority_desc(opportunity::all_candidates(pool));
    match all.into_iter().next() {
        Some(action) => vec![vec![action]],
        None => vec![],
    }
}

/// `multi_sell`: every sell-side candidate in the pool, one sequence.
fn multi_sell(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let max = settings.param_usize("max_actions", 10);
    let sells: Vec<ActionCandidate> = opportunity::all_candidates(pool)
        .into_iter()
        .filter(|a| a.side == Side::Sell)
        .collect();
    let sequence = take(by_priority_desc(sells), max);
    if sequence.is_empty() {
        vec![]
    } else {
        vec![sequence]
    }
}

/// `mixed_strategy`: top half of the budget from sells, the rest from buys,
/// by priority within each side.
fn mixed_strategy(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let max = settings.param_usize("max_actions", 10);
    let all = opportunity::all_candidates(pool);
    let sells = by_priority_desc(all.iter().filter(|a| a.side == Side::Sell).cloned().collect());
    let buys = by_priority_desc(all.into_iter().filter(|a| a.side == Side::Buy).collect());
    let half = max / 2;
    let mut sequence = take(sells, half);
    sequence.extend(take(buys, max - sequence.len()));
    if sequence.is_empty() {
        vec![]
    } else {
        vec![sequence]
    }
}

/// `opportunity_first`: opportunity buys ahead of rebalance actions.
fn opportunity_first(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let max = settings.param_usize("max_actions", 10);
    let mut sequence = by_priority_desc(opportunity::category(pool, OPPORTUNITY_BUYS));
    sequence.extend(by_priority_desc(opportunity::category(pool, REBALANCE_SELLS)));
    sequence.extend(by_priority_desc(opportunity::category(pool, REBALANCE_BUYS)));
    let sequence = take(sequence, max);
    if sequence.is_empty() {
        vec![]
    } else {
        vec![sequence]
    }
}

/// `deep_rebalance`: the wider `weight_based` sweep instead of the tighter
/// rebalance calculators, for cycles that want to close every drift.
fn deep_rebalance(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let max = settings.param_usize("max_actions", 20);
    let actions = by_priority_desc(opportunity::category(pool, WEIGHT_BASED));
    let sequence = take(actions, max);
    if sequence.is_empty() {
        vec![]
    } else {
        vec![sequence]
    }
}

/// `cash_generation`: sells only, largest value first, to raise a cash
/// buffer (e.g. ahead of a withdrawal).
fn cash_generation(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let max = settings.param_usize("max_actions", 10);
    let mut sells: Vec<ActionCandidate> = opportunity::all_candidates(pool)
        .into_iter()
        .filter(|a| a.side == Side::Sell)
        .collect();
    sells.sort_by(|a, b| b.value_eur.cmp(&a.value_eur));
    let sequence = take(sells, max);
    if sequence.is_empty() {
        vec![]
    } else {
        vec![sequence]
    }
}

/// `cost_optimized`: fewest actions that still cover the highest-priority
/// opportunities, favoring large trades over many small ones.
fn cost_optimized(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let max = settings.param_usize("max_actions", 5);
    let mut all = opportunity::all_candidates(pool);
    all.sort_by(|a, b| b.value_eur.cmp(&a.value_eur));
    let sequence = take(all, max);
    if sequence.is_empty() {
        vec![]
    } else {
        vec![sequence]
    }
}

/// `adaptive`: picks between `opportunity_first`-style and `rebalance`-style
/// ordering based on which category carries the higher average priority.
fn adaptive(pool: Pool, settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let opportunity_avg = average_priority(opportunity::category(pool, OPPORTUNITY_BUYS));
    let rebalance_avg = {
        let mut combined = opportunity::category(pool, REBALANCE_SELLS);
        combined.extend(opportunity::category(pool, REBALANCE_BUYS));
        average_priority(combined)
    };
    if opportunity_avg >= rebalance_avg {
        opportunity_first(pool, settings)
    } else {
        rebalance(pool, settings)
    }
}

fn average_priority(actions: Vec<ActionCandidate>) -> f64 {
    if actions.is_empty() {
        return 0.0;
    }
    actions.iter().map(|a| a.priority).sum::<f64>() / actions.len() as f64
}

/// `market_regime`: bull biases toward `opportunity_first`, bear toward
/// `profit_taking`, sideways/neutral toward `rebalance`.
fn market_regime(
    ctx: &PlanningContext,
    pool: Pool,
    settings: &ModuleSettings,
) -> Vec<Vec<ActionCandidate>> {
    match ctx.regime {
        Regime::Bull => opportunity_first(pool, settings),
        Regime::Bear => profit_taking(pool, settings),
        Regime::Sideways | Regime::Neutral => rebalance(pool, settings),
    }
}

/// Runs every enabled, known pattern generator and concatenates their
/// output sequences for stage 3 to expand further.
pub fn run_enabled(
    ctx: &PlanningContext,
    pool: Pool,
    config: &ModuleConfig,
) -> Vec<Vec<ActionCandidate>> {
    let mut sequences = Vec::new();
    for name in config.enabled_names(KNOWN_PATTERNS) {
        let settings = config.settings(name);
        let produced = match name {
            DIRECT_BUY => direct_buy(pool, &settings),
            PROFIT_TAKING_PATTERN => profit_taking(pool, &settings),
            REBALANCE => rebalance(pool, &settings),
            AVERAGING_DOWN_PATTERN => averaging_down(pool, &settings),
            SINGLE_BEST => single_best(pool, &settings),
            MULTI_SELL => multi_sell(pool, &settings),
            MIXED_STRATEGY => mixed_strategy(pool, &settings),
            OPPORTUNITY_FIRST => opportunity_first(pool, &settings),
            DEEP_REBALANCE => deep_rebalance(pool, &settings),
            CASH_GENERATION => cash_generation(pool, &settings),
            COST_OPTIMIZED => cost_optimized(pool, &settings),
            ADAPTIVE => adaptive(pool, &settings),
            MARKET_REGIME => market_regime(ctx, pool, &settings),
            _ => unreachable!("validated against KNOWN_PATTERNS at config load"),
        };
        sequences.extend(produced);
    }
    sequences
}
