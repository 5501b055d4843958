//! The broker adapter contract (§6 "Broker adapter").
//!
//! The core consumes exactly five operations. Everything about how a given
//! broker's API is actually reached — auth, rate limits, reconnect,
//! request signing — is the adapter implementation's problem: [`BrokerAdapter`]
//! isolates transport plumbing from business logic, narrowed to the calls
//! the planning core needs rather than full order-lifecycle control.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CashBalance {
    pub currency: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum BrokerSide {
    Buy,
    Sell,
}

/// The broker's view of one held position, before the core maps it onto its
/// own [`glidepath_core::position::Position`] shape.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BrokerPosition {
    pub isin: String,
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_price: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlacedOrder {
    pub order_id: String,
    pub symbol: String,
    pub side: BrokerSide,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Quote {
    pub price: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("broker unavailable: {0}")]
    Unavailable(String),
    #[error("broker rejected request: {0}")]
    Rejected(String),
}

/// Five operations the planning core consumes from a broker integration.
/// Implementations live outside this workspace's scope (§1 "OUT OF
/// SCOPE") — this trait only pins down the shape the core codes against.
#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    async fn is_connected(&self) -> bool;
    async fn get_cash_balances(&self) -> Result<Vec<CashBalance>, BrokerError>;
    async fn get_portfolio(&self) -> Result<Vec<BrokerPosition>, BrokerError>;
    async fn place_order(
        &self,
        isin_or_symbol: &str,
        side: BrokerSide,
        quantity: Decimal,
    ) -> Result<PlacedOrder, BrokerError>;
    async fn get_quote(&self, symbol: &str) -> Result<Quote, BrokerError>;
}

/// A fixed-response adapter for tests and local development; never reaches
/// the network.
#[derive(Debug, Clone, Default)]
pub struct MockBrokerAdapter {
    pub connected: bool,
    pub cash_balances: Vec<CashBalance>,
    pub portfolio: Vec<BrokerPosition>,
}

#[async_trait]
impl BrokerAdapter for MockBrokerAdapter {
    async fn is_connected(&self) -> bool {
        self.connected
    }

    async fn get_cash_balances(&self) -> Result<Vec<CashBalance>, BrokerError> {
        Ok(self.cash_balances.clone())
    }

    async fn get_portfolio(&self) -> Result<Vec<BrokerPosition>, BrokerError> {
        Ok(self.portfolio.clone())
    }

    async fn place_order(
        &self,
        isin_or_symbol: &str,
        side: BrokerSide,
        quantity: Decimal,
    ) -> Result<PlacedOrder, BrokerError> {
        if !self.connected {
            return Err(BrokerError::Unavailable("mock adapter disconnected".to_string()));
        }
        Ok(PlacedOrder {
            order_id: format!("MOCK-{isin_or_symbol}-{quantity}"),
            symbol: isin_or_symbol.to_string(),
            side,
            quantity,
            price: Decimal::ZERO,
        })
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, BrokerError> {
        Err(BrokerError::Unavailable(format!("mock adapter has no quote for {symbol}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn disconnected_mock_rejects_orders() {
        let adapter = MockBrokerAdapter::default();
        let result = adapter.place_order("IE00B4L5Y983", BrokerSide::Buy, dec!(1)).await;
        assert!(matches!(result, Err(BrokerError::Unavailable(_))));
    }

    #[tokio::test]
    async fn connected_mock_echoes_the_order() {
        let adapter = MockBrokerAdapter {
            connected: true,
            ..Default::default()
        };
        let order = adapter
            .place_order("IE00B4L5Y983", BrokerSide::Buy, dec!(5))
            .await
            .unwrap();
        assert_eq!(order.quantity, dec!(5));
    }
}
