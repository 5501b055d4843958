//! Emergency balance repair (§4.1).
//!
//! A periodic check flags any trading currency whose broker cash drops
//! below [`crate::MIN_PER_CURRENCY`] or negative. This module only *plans*
//! the repair — the exchange and sell legs are carried out by the external
//! broker adapter (`glidepath-external`) and the plan generator
//! (`glidepath-planner`); the ledger's role is to detect the shortfall and
//! describe the three-phase flow the rest of the pipeline must execute.

use crate::Ledger;
use glidepath_core::Currency;
use rust_decimal::Decimal;

/// One trading currency whose broker cash is below the minimum reserve.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortfallCurrency {
    pub currency: Currency,
    pub broker_cash: Decimal,
    pub deficit: Decimal,
}

/// A single leg of the three-phase `exchange → sell → exchange` repair flow.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairStep {
    /// Phase 1: exchange surplus cash from `from` into `to` to cover (part
    /// of) the shortfall without touching positions.
    ExchangeFromSurplus {
        from: Currency,
        to: Currency,
        amount: Decimal,
    },
    /// Phase 2: still short after exchanging surplus — sell the largest
    /// sellable positions denominated in other currencies. The concrete
    /// candidates are selected by the plan generator; this step only
    /// records which currency needs the proceeds.
    EmergencySell { raise_in: Currency },
    /// Phase 3: once sale proceeds land, a final exchange tops every
    /// trading currency above the minimum reserve.
    FinalExchange {
        from: Currency,
        to: Currency,
        amount: Decimal,
    },
}

/// Flags every `trading_currency` whose `broker_cash` is below the minimum
/// reserve or negative. `trading_currencies` is every currency appearing on
/// at least one active security (an input from the universe, not the
/// ledger itself).
pub fn flag_shortfalls(
    ledger: &Ledger,
    trading_currencies: &[Currency],
    broker_cash: &[(Currency, Decimal)],
) -> Vec<ShortfallCurrency> {
    let min_reserve = ledger.min_currency_reserve();
    trading_currencies
        .iter()
        .filter_map(|currency| {
            let cash = broker_cash
                .iter()
                .find(|(c, _)| c == currency)
                .map(|(_, amount)| *amount)
                .unwrap_or(Decimal::ZERO);
            if cash < Decimal::ZERO || cash < min_reserve {
                Some(ShortfallCurrency {
                    currency: currency.clone(),
                    broker_cash: cash,
                    deficit: (min_reserve - cash).max(Decimal::ZERO),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Builds the three-phase repair plan for one shortfall currency, given the
/// other trading currencies ranked by surplus above their own minimum
/// reserve (largest surplus first).
pub fn plan_repair(
    ledger: &Ledger,
    shortfall: &ShortfallCurrency,
    surplus_currencies: &[(Currency, Decimal)],
) -> Vec<RepairStep> {
    let min_reserve = ledger.min_currency_reserve();
    let mut remaining = shortfall.deficit;
    let mut steps = Vec::new();

    for (source, surplus) in surplus_currencies {
        if remaining.is_zero() {
            break;
        }
        let available = (*surplus - min_reserve).max(Decimal::ZERO);
        if available.is_zero() {
            continue;
        }
        let amount = available.min(remaining);
        steps.push(RepairStep::ExchangeFromSurplus {
            from: source.clone(),
            to: shortfall.currency.clone(),
            amount,
        });
        remaining -= amount;
    }

    if !remaining.is_zero() {
        steps.push(RepairStep::EmergencySell {
            raise_in: shortfall.currency.clone(),
        });
        steps.push(RepairStep::FinalExchange {
            from: shortfall.currency.clone(),
            to: shortfall.currency.clone(),
            amount: remaining,
        });
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ledger;
    use glidepath_core::test_utils::eur;
    use rust_decimal_macros::dec;

    fn usd() -> Currency {
        Currency::from("USD")
    }

    #[test]
    fn flag_shortfalls_detects_below_minimum_cash() {
        let ledger = Ledger::new(vec![], 0.0, dec!(5));
        let shortfalls = flag_shortfalls(&ledger, &[eur(), usd()], &[(eur(), dec!(2.00)), (usd(), dec!(100))]);
        assert_eq!(shortfalls.len(), 1);
        assert_eq!(shortfalls[0].currency, eur());
        assert_eq!(shortfalls[0].deficit, dec!(3.00));
    }

    #[test]
    fn plan_repair_covers_deficit_from_surplus_alone() {
        let ledger = Ledger::new(vec![], 0.0, dec!(5));
        let shortfall = ShortfallCurrency {
            currency: eur(),
            broker_cash: dec!(2.00),
            deficit: dec!(3.00),
        };
        let steps = plan_repair(&ledger, &shortfall, &[(usd(), dec!(50))]);
        assert_eq!(
            steps,
            vec![RepairStep::ExchangeFromSurplus {
                from: usd(),
                to: eur(),
                amount: dec!(3.00),
            }]
        );
    }

    #[test]
    fn plan_repair_falls_through_to_emergency_sell_when_surplus_insufficient() {
        let ledger = Ledger::new(vec![], 0.0, dec!(5));
        let shortfall = ShortfallCurrency {
            currency: eur(),
            broker_cash: dec!(-10.00),
            deficit: dec!(15.00),
        };
        let steps = plan_repair(&ledger, &shortfall, &[]);
        assert!(matches!(steps[0], RepairStep::EmergencySell { .. }));
        assert!(matches!(steps[1], RepairStep::FinalExchange { .. }));
    }
}
