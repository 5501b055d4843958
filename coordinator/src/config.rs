//! Cycle-wide configuration (§6 "Configuration"): the knobs that don't
//! belong to any single C1-C5 crate because they govern how the
//! coordinator drives them, not what any one stage computes.

use chrono::Duration as ChronoDuration;
use glidepath_evaluator::{ScoringConfig, TransactionCostConfig};
use glidepath_planner::PlannerConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-position concentration cap (§6).
pub const DEFAULT_MAX_POSITION_CONCENTRATION: f64 = 0.15;
/// Default per-country concentration cap (§6). Enforced by the planner's
/// eligibility/diversity filters rather than the optimizer's single group
/// constraint — see `DESIGN.md` for why sector, not country, is the
/// dimension wired into `GroupConstraint`.
pub const DEFAULT_MAX_COUNTRY_CONCENTRATION: f64 = 0.35;
/// Default per-sector concentration cap (§6), wired into the optimizer's
/// `GroupConstraint`.
pub const DEFAULT_MAX_SECTOR_CONCENTRATION: f64 = 0.30;

/// Default `top_k` recommendations persisted per cycle (§4.6).
pub const DEFAULT_TOP_K: usize = 10;

/// Default time a cached `TargetWeights` stays valid (§4.6 "cache with the
/// portfolio hash").
pub const DEFAULT_CACHE_TTL: ChronoDuration = ChronoDuration::hours(1);

/// Default wall-clock budget for a full cycle or batch endpoint (§4.6
/// "Cancellation & timeouts").
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Default tranche size for incremental batch mode (§4.6).
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Everything C6 needs beyond what C2/C3/C4/C5 already expose as their own
/// config types.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CoordinatorConfig {
    pub top_k: usize,
    #[serde(with = "chrono_duration_seconds")]
    pub cache_ttl: ChronoDuration,
    pub deadline: Duration,
    pub batch_size: usize,

    /// `λ ∈ [0,1]`, the optimizer's HRP blend factor (default 0.5).
    pub optimizer_blend: f64,
    /// `r*`, the optimizer's target return (default 0.11).
    pub optimizer_target_return: f64,
    /// `σ_cap`, the risk cap fed to `efficient_risk` when `efficient_return`
    /// is infeasible.
    pub optimizer_risk_cap: f64,

    pub max_position_concentration: f64,
    pub max_country_concentration: f64,
    pub max_sector_concentration: f64,

    pub cost_config: TransactionCostConfig,
    pub scoring_config: ScoringConfig,
    pub planner_config: PlannerConfig,

    /// Per-currency reserve floor the simulation fold refuses to breach
    /// (default €5, distinct from the ledger's €500 `MIN_PER_CURRENCY`).
    pub min_currency_reserve: Decimal,

    /// Universe schema version; bumped whenever securities are added,
    /// removed, or re-keyed, so a stale cache entry never survives a
    /// universe change even if positions and cash happen to match.
    pub universe_version: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            cache_ttl: DEFAULT_CACHE_TTL,
            deadline: DEFAULT_DEADLINE,
            batch_size: DEFAULT_BATCH_SIZE,
            optimizer_blend: 0.5,
            optimizer_target_return: 0.11,
            optimizer_risk_cap: 0.25,
            max_position_concentration: DEFAULT_MAX_POSITION_CONCENTRATION,
            max_country_concentration: DEFAULT_MAX_COUNTRY_CONCENTRATION,
            max_sector_concentration: DEFAULT_MAX_SECTOR_CONCENTRATION,
            cost_config: TransactionCostConfig::default(),
            scoring_config: ScoringConfig::default(),
            planner_config: PlannerConfig::default(),
            min_currency_reserve: glidepath_evaluator::DEFAULT_MIN_CURRENCY_RESERVE,
            universe_version: 1,
        }
    }
}

mod chrono_duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = i64::deserialize(deserializer)?;
        Ok(Duration::seconds(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_configuration_surface() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.top_k, 10);
        assert_eq!(config.optimizer_blend, 0.5);
        assert_eq!(config.optimizer_target_return, 0.11);
        assert_eq!(config.max_position_concentration, 0.15);
        assert_eq!(config.max_country_concentration, 0.35);
        assert_eq!(config.max_sector_concentration, 0.30);
        assert_eq!(config.cache_ttl, ChronoDuration::hours(1));
    }
}
