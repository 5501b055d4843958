//! FX pairs the broker adapter is expected to support (§6): `EUR↔USD`,
//! `EUR↔GBP`, `GBP↔USD`, `EUR↔HKD`, `USD↔HKD`; the one indirect pair,
//! `GBP↔HKD`, routes via `EUR` since it has no direct quote.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Eur,
    Usd,
    Gbp,
    Hkd,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Hkd => "HKD",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FxError {
    #[error("no direct or routed FX pair from {from} to {to}")]
    NoRoute { from: String, to: String },
}

/// A quote table: direct rates as actually observed, keyed by `(from, to)`.
/// `convert` looks up a direct rate first, then tries the `EUR`-routed path
/// for the one indirect pair, `GBP↔HKD`.
#[derive(Debug, Clone, Default)]
pub struct FxRates {
    direct: Vec<((Currency, Currency), Decimal)>,
}

impl FxRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rate(&mut self, from: Currency, to: Currency, rate: Decimal) {
        self.direct.push(((from, to), rate));
    }

    fn direct_rate(&self, from: Currency, to: Currency) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        self.direct
            .iter()
            .find(|((f, t), _)| *f == from && *t == to)
            .map(|(_, rate)| *rate)
            .or_else(|| {
                self.direct
                    .iter()
                    .find(|((f, t), _)| *f == to && *t == from)
                    .map(|(_, rate)| Decimal::ONE / *rate)
            })
    }

    pub fn convert(&self, amount: Decimal, from: Currency, to: Currency) -> Result<Decimal, FxError> {
        if let Some(rate) = self.direct_rate(from, to) {
            return Ok(amount * rate);
        }
        // GBP<->HKD has no direct quote in the supported pair list; route via EUR.
        if let (Some(to_eur), Some(from_eur)) =
            (self.direct_rate(from, Currency::Eur), self.direct_rate(Currency::Eur, to))
        {
            return Ok(amount * to_eur * from_eur);
        }
        Err(FxError::NoRoute {
            from: from.code().to_string(),
            to: to.code().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_rates() -> FxRates {
        let mut rates = FxRates::new();
        rates.set_rate(Currency::Eur, Currency::Usd, dec!(1.08));
        rates.set_rate(Currency::Eur, Currency::Gbp, dec!(0.85));
        rates.set_rate(Currency::Gbp, Currency::Usd, dec!(1.27));
        rates.set_rate(Currency::Eur, Currency::Hkd, dec!(8.45));
        rates.set_rate(Currency::Usd, Currency::Hkd, dec!(7.82));
        rates
    }

    #[test]
    fn direct_pair_converts_without_routing() {
        let rates = sample_rates();
        assert_eq!(rates.convert(dec!(100), Currency::Eur, Currency::Usd).unwrap(), dec!(108));
    }

    #[test]
    fn inverse_of_a_quoted_pair_is_derived() {
        let rates = sample_rates();
        let converted = rates.convert(dec!(108), Currency::Usd, Currency::Eur).unwrap();
        assert!((converted - dec!(100)).abs() < dec!(0.001));
    }

    #[test]
    fn gbp_hkd_routes_through_eur() {
        let rates = sample_rates();
        let result = rates.convert(dec!(100), Currency::Gbp, Currency::Hkd);
        assert!(result.is_ok());
    }

    #[test]
    fn unknown_currency_without_a_route_fails() {
        let rates = FxRates::new();
        let result = rates.convert(dec!(100), Currency::Gbp, Currency::Hkd);
        assert!(matches!(result, Err(FxError::NoRoute { .. })));
    }
}
