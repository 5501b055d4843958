//! The market-data endpoint contract (§6 "Market-data endpoint"), consumed
//! by `glidepath-returns` (C2) for current-price lookups and the macro
//! inputs that feed the forward adjustment (§4.2).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Default)]
pub struct FundamentalData {
    pub pe_ratio: Option<f64>,
}

/// The three macro signals the forward adjustment (§4.2) sums contributions
/// from. Any of them may be unavailable; C2 skips an absent contribution
/// rather than failing the whole calculation (§7 "C2 tolerates missing
/// inputs").
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Default)]
pub struct MacroSignals {
    pub vix: Option<f64>,
    pub sp500_pe: Option<f64>,
    pub yield_curve_slope: Option<f64>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("market data unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Retries up to `retries` times before giving up; returns `None`
    /// (never an error) when the symbol has no current price —
    /// `get_current_price(symbol, retries=3) -> float?`.
    async fn get_current_price(&self, symbol: &str, retries: u32) -> Option<f64>;

    async fn get_fundamental_data(&self, symbol: &str) -> Result<FundamentalData, MarketDataError>;

    /// The concrete input the forward adjustment (§4.2) needs; a real
    /// implementation sources it from whatever macro feed backs
    /// VIX/P-E/yield-curve data.
    async fn get_macro_signals(&self) -> Result<MacroSignals, MarketDataError>;
}

/// A fixed-response client for tests; mirrors [`crate::broker::MockBrokerAdapter`].
#[derive(Debug, Clone, Default)]
pub struct MockMarketDataClient {
    pub prices: Vec<(String, f64)>,
    pub macro_signals: MacroSignals,
}

#[async_trait]
impl MarketDataClient for MockMarketDataClient {
    async fn get_current_price(&self, symbol: &str, _retries: u32) -> Option<f64> {
        self.prices.iter().find(|(s, _)| s == symbol).map(|(_, p)| *p)
    }

    async fn get_fundamental_data(&self, _symbol: &str) -> Result<FundamentalData, MarketDataError> {
        Ok(FundamentalData::default())
    }

    async fn get_macro_signals(&self) -> Result<MacroSignals, MarketDataError> {
        Ok(self.macro_signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_symbol_returns_none_not_an_error() {
        let client = MockMarketDataClient::default();
        assert_eq!(client.get_current_price("UNKNOWN", 3).await, None);
    }

    #[tokio::test]
    async fn known_symbol_returns_its_price() {
        let client = MockMarketDataClient {
            prices: vec![("IWDA".to_string(), 95.2)],
            ..Default::default()
        };
        assert_eq!(client.get_current_price("IWDA", 3).await, Some(95.2));
    }
}
