//! Named sub-portfolios: `core` plus optional satellites.

use derive_more::Constructor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum BucketStatus {
    Active,
    Accumulating,
    Hibernating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum DividendHandling {
    #[default]
    Reinvest,
    HoldCash,
}

/// Optional strategy settings carried by a satellite bucket. None of these
/// fields are interpreted by the ledger; they're read by C4's pattern
/// generators and C5's regime overlay.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct BucketSettings {
    pub risk_appetite: Option<f64>,
    pub hold_duration_days: Option<u32>,
    pub entry_style: Option<String>,
    pub position_spread: Option<u32>,
    pub profit_taking: Option<f64>,
    pub trailing_stops: Option<f64>,
    pub follow_regime: bool,
    pub auto_harvest: bool,
    pub pause_high_volatility: bool,
    pub dividend_handling: DividendHandling,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct BucketId(pub String);

impl std::fmt::Display for BucketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BucketId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl BucketId {
    pub fn core() -> Self {
        Self("core".to_string())
    }

    pub fn is_core(&self) -> bool {
        self.0 == "core"
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Bucket {
    pub id: BucketId,
    /// `None` for `core`: its target share is the residual after satellites.
    pub target_pct: Option<f64>,
    pub status: BucketStatus,
    pub settings: Option<BucketSettings>,
}

impl Bucket {
    pub fn core() -> Self {
        Self::new(BucketId::core(), None, BucketStatus::Active, None)
    }

    pub fn satellite(id: impl Into<String>, target_pct: f64, status: BucketStatus) -> Self {
        Self::new(
            BucketId(id.into()),
            Some(target_pct),
            status,
            Some(BucketSettings::default()),
        )
    }
}

/// Validates the "satellites sum to at most 30%" invariant from the data
/// model and returns `core`'s implied residual share.
pub fn core_residual_share(satellites: &[Bucket]) -> Result<f64, String> {
    let satellite_sum: f64 = satellites
        .iter()
        .filter_map(|bucket| bucket.target_pct)
        .sum();
    if satellite_sum > 0.30 + f64::EPSILON {
        return Err(format!(
            "satellite target_pct sum {satellite_sum} exceeds the 0.30 cap"
        ));
    }
    Ok(1.0 - satellite_sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_residual_share_is_one_minus_satellites() {
        let satellites = vec![
            Bucket::satellite("sat1", 0.10, BucketStatus::Active),
            Bucket::satellite("sat2", 0.10, BucketStatus::Accumulating),
        ];
        assert!((core_residual_share(&satellites).unwrap() - 0.80).abs() < 1e-9);
    }

    #[test]
    fn satellite_budget_over_cap_is_rejected() {
        let satellites = vec![Bucket::satellite("sat1", 0.31, BucketStatus::Active)];
        assert!(core_residual_share(&satellites).is_err());
    }
}
