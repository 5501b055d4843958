//! Held quantities per security: [`Position`].

use crate::bucket::BucketId;
use crate::security::Isin;
use crate::Currency;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A held quantity of one security inside one bucket.
///
/// Created by the first execution against an empty slot; destroyed when
/// `quantity` reaches zero (history survives in the cash-flow/trade journal,
/// not here).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Position {
    pub isin: Isin,
    pub quantity: Decimal,
    pub avg_price: Decimal,
    pub currency: Currency,
    pub currency_rate: Decimal,
    /// Derived; may lag the broker by up to one sync interval.
    pub market_value_eur: Decimal,
    pub bucket_id: BucketId,
    pub first_bought_at: DateTime<Utc>,
    pub last_sold_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn is_closed(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Applies a BUY fill, updating quantity and the weighted-average cost
    /// basis. Panics-free: callers are expected to have already validated
    /// `quantity > 0` and `price > 0` at the boundary.
    pub fn apply_buy(&mut self, quantity: Decimal, price: Decimal) {
        let existing_cost = self.avg_price * self.quantity;
        let incoming_cost = price * quantity;
        let new_quantity = self.quantity + quantity;
        if !new_quantity.is_zero() {
            self.avg_price = (existing_cost + incoming_cost) / new_quantity;
        }
        self.quantity = new_quantity;
    }

    /// Applies a SELL fill. Returns `Err` if `quantity` exceeds the held
    /// amount; the avg cost basis is unaffected by sells.
    pub fn apply_sell(&mut self, quantity: Decimal, sold_at: DateTime<Utc>) -> Result<(), String> {
        if quantity > self.quantity {
            return Err(format!(
                "cannot sell {quantity} of {}: only {} held",
                self.isin, self.quantity
            ));
        }
        self.quantity -= quantity;
        self.last_sold_at = Some(sold_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::eur;
    use rust_decimal_macros::dec;

    fn sample() -> Position {
        Position::new(
            Isin::from("IE00B4L5Y983"),
            dec!(10),
            dec!(90.00),
            eur(),
            dec!(1),
            dec!(950.00),
            BucketId::core(),
            Utc::now(),
            None,
        )
    }

    #[test]
    fn apply_buy_updates_weighted_average_cost() {
        let mut position = sample();
        position.apply_buy(dec!(10), dec!(110.00));
        assert_eq!(position.quantity, dec!(20));
        assert_eq!(position.avg_price, dec!(100.00));
    }

    #[test]
    fn apply_sell_beyond_holding_is_rejected() {
        let mut position = sample();
        assert!(position.apply_sell(dec!(11), Utc::now()).is_err());
        assert_eq!(position.quantity, dec!(10));
    }

    #[test]
    fn apply_sell_to_zero_marks_closed() {
        let mut position = sample();
        position.apply_sell(dec!(10), Utc::now()).unwrap();
        assert!(position.is_closed());
    }
}
