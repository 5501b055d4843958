#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]
//! # Glidepath Ledger
//!
//! Per-bucket, per-currency cash balances with an append-only transaction
//! journal and reconciliation against broker truth (component C1).
//!
//! ## Atomicity
//!
//! Every operation that mutates a balance appends the matching journal entry
//! in the same unit of work: [`Ledger::with_tx`] snapshots balances before
//! running a mutation and restores them if it fails, so callers never
//! observe a balance update without its journal entry or vice versa.
//!
//! ## Ownership
//!
//! This crate exclusively owns [`BucketBalance`] and [`BucketTransaction`];
//! no other crate in the workspace constructs or mutates them directly.

pub mod balance;
pub mod repair;
pub mod transaction;

use balance::BucketBalance;
use chrono::Utc;
use glidepath_core::bucket::{Bucket, BucketId, BucketStatus};
use glidepath_core::error::GlidepathError;
use glidepath_core::Currency;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use transaction::{BucketTransaction, TransactionKind};

/// Default minimum balance the emergency repair check guards against
/// (`min_currency_reserve` in the configuration surface, §6).
pub const MIN_PER_CURRENCY: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

/// Default reconciliation tolerance (`€5` rounding drift, §4.1).
pub const RECONCILE_TOLERANCE: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

type BalanceKey = (BucketId, Currency);

/// The per-bucket, per-currency cash ledger.
///
/// An in-memory projection over the append-only journal; the surrounding
/// application is responsible for durably persisting `journal` to the
/// `ledger` store (§6) after each call that returns `Ok`.
#[derive(Debug, Clone)]
pub struct Ledger {
    buckets: Vec<Bucket>,
    balances: IndexMap<BalanceKey, Decimal>,
    journal: Vec<BucketTransaction>,
    satellite_budget_pct: f64,
    min_currency_reserve: Decimal,
}

/// Outcome of [`Ledger::reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub is_reconciled: bool,
    pub adjustment: Decimal,
}

impl Ledger {
    pub fn new(buckets: Vec<Bucket>, satellite_budget_pct: f64, min_currency_reserve: Decimal) -> Self {
        Self {
            buckets,
            balances: IndexMap::new(),
            journal: Vec::new(),
            satellite_budget_pct,
            min_currency_reserve,
        }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn journal(&self) -> &[BucketTransaction] {
        &self.journal
    }

    pub fn get_balance(&self, bucket: &BucketId, currency: &Currency) -> Decimal {
        self.balances
            .get(&(bucket.clone(), currency.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn get_breakdown(&self, currency: &Currency) -> IndexMap<BucketId, Decimal> {
        self.balances
            .iter()
            .filter(|((_, currency_key), _)| currency_key == currency)
            .map(|((bucket, _), amount)| (bucket.clone(), *amount))
            .collect()
    }

    /// Total ledger cash for `currency` across every bucket; the quantity
    /// that must equal `broker.cash(currency)` up to tolerance (invariant 1).
    pub fn total_balance(&self, currency: &Currency) -> Decimal {
        self.get_breakdown(currency).values().sum()
    }

    pub fn snapshot(&self) -> Vec<BucketBalance> {
        let now = Utc::now();
        self.balances
            .iter()
            .map(|((bucket, currency), amount)| {
                BucketBalance::new(bucket.clone(), currency.clone(), *amount, now)
            })
            .collect()
    }

    /// Runs `mutate`; if it returns `Err`, restores the balance table (and
    /// truncates the journal back to its pre-call length) so the operation
    /// has no partial effect. The explicit wrapper mentioned in the design
    /// notes, in place of a begin/rollback-in-defer idiom.
    fn with_tx<T>(
        &mut self,
        mutate: impl FnOnce(&mut Self) -> Result<T, GlidepathError>,
    ) -> Result<T, GlidepathError> {
        let balances_before = self.balances.clone();
        let journal_len_before = self.journal.len();
        match mutate(self) {
            Ok(value) => Ok(value),
            Err(error) => {
                self.balances = balances_before;
                self.journal.truncate(journal_len_before);
                Err(error)
            }
        }
    }

    fn bucket_exists(&self, bucket: &BucketId) -> bool {
        bucket.is_core() || self.buckets.iter().any(|entry| &entry.id == bucket)
    }

    fn require_bucket(&self, bucket: &BucketId) -> Result<(), GlidepathError> {
        if self.bucket_exists(bucket) {
            Ok(())
        } else {
            Err(GlidepathError::UnknownBucket(bucket.to_string()))
        }
    }

    fn adjust(&mut self, bucket: &BucketId, currency: &Currency, delta: Decimal) {
        let key = (bucket.clone(), currency.clone());
        let entry = self.balances.entry(key).or_insert(Decimal::ZERO);
        *entry += delta;
    }

    fn append(
        &mut self,
        bucket: &BucketId,
        kind: TransactionKind,
        amount: Decimal,
        currency: &Currency,
        description: impl Into<String>,
    ) {
        self.journal.push(BucketTransaction::new(
            bucket.clone(),
            kind,
            amount,
            currency.clone(),
            description.into(),
            Utc::now(),
        ));
    }

    /// `record_trade_settlement(bucket, amount ≥ 0, currency, is_buy, desc)`.
    pub fn record_trade_settlement(
        &mut self,
        bucket: &BucketId,
        amount: Decimal,
        currency: &Currency,
        is_buy: bool,
        description: impl Into<String>,
    ) -> Result<(), GlidepathError> {
        if amount < Decimal::ZERO {
            return Err(GlidepathError::NegativeAmount(format!(
                "trade settlement amount {amount} must be >= 0"
            )));
        }
        self.require_bucket(bucket)?;
        let description = description.into();
        self.with_tx(|ledger| {
            let signed = if is_buy { -amount } else { amount };
            ledger.adjust(bucket, currency, signed);
            let kind = if is_buy {
                TransactionKind::TradeBuy
            } else {
                TransactionKind::TradeSell
            };
            ledger.append(bucket, kind, signed, currency, description.clone());
            Ok(())
        })
    }

    /// `record_dividend(bucket, amount > 0, currency, desc)`.
    pub fn record_dividend(
        &mut self,
        bucket: &BucketId,
        amount: Decimal,
        currency: &Currency,
        description: impl Into<String>,
    ) -> Result<(), GlidepathError> {
        if amount <= Decimal::ZERO {
            return Err(GlidepathError::NegativeAmount(format!(
                "dividend amount {amount} must be > 0"
            )));
        }
        self.require_bucket(bucket)?;
        let description = description.into();
        self.with_tx(|ledger| {
            ledger.adjust(bucket, currency, amount);
            ledger.append(bucket, TransactionKind::Dividend, amount, currency, description.clone());
            Ok(())
        })
    }

    /// The floor a transfer out of `core` must respect: `1 −
    /// satellite_budget_pct`, expressed against `core`'s share of total
    /// ledger cash in `currency` after the hypothetical transfer.
    fn core_share_after(&self, currency: &Currency, core_delta: Decimal) -> f64 {
        let total = self.total_balance(currency);
        if total.is_zero() {
            return 1.0;
        }
        let core_after = self.get_balance(&BucketId::core(), currency) + core_delta;
        (core_after / total).to_string().parse().unwrap_or(0.0)
    }

    /// `transfer(from_bucket, to_bucket, amount, currency, desc)`.
    pub fn transfer(
        &mut self,
        from_bucket: &BucketId,
        to_bucket: &BucketId,
        amount: Decimal,
        currency: &Currency,
        description: impl Into<String>,
    ) -> Result<(), GlidepathError> {
        if amount < Decimal::ZERO {
            return Err(GlidepathError::NegativeAmount(format!(
                "transfer amount {amount} must be >= 0"
            )));
        }
        self.require_bucket(from_bucket)?;
        self.require_bucket(to_bucket)?;

        let available = self.get_balance(from_bucket, currency);
        if available < amount {
            return Err(GlidepathError::InsufficientFunds {
                bucket: from_bucket.to_string(),
                currency: currency.to_string(),
                requested: amount.to_string(),
                available: available.to_string(),
            });
        }

        if from_bucket.is_core() {
            let floor = 1.0 - self.satellite_budget_pct;
            let resulting_share = self.core_share_after(currency, -amount);
            if resulting_share < floor {
                return Err(GlidepathError::CoreFloorViolated {
                    resulting_core_share: format!("{resulting_share:.4}"),
                    floor: format!("{floor:.4}"),
                });
            }
        }

        let description = description.into();
        self.with_tx(|ledger| {
            ledger.adjust(from_bucket, currency, -amount);
            ledger.adjust(to_bucket, currency, amount);
            ledger.append(
                from_bucket,
                TransactionKind::TransferOut,
                -amount,
                currency,
                description.clone(),
            );
            ledger.append(to_bucket, TransactionKind::TransferIn, amount, currency, description.clone());
            Ok(())
        })
    }

    /// `allocate_deposit(total, currency, desc) → Map[bucket → amount]`.
    ///
    /// Tops `core` up to its target share first, then distributes any
    /// remainder proportionally to each accumulating/active satellite's
    /// deficit below target; leftover goes back to `core`.
    pub fn allocate_deposit(
        &mut self,
        total: Decimal,
        currency: &Currency,
        description: impl Into<String>,
    ) -> Result<IndexMap<BucketId, Decimal>, GlidepathError> {
        if total < Decimal::ZERO {
            return Err(GlidepathError::NegativeAmount(format!(
                "deposit amount {total} must be >= 0"
            )));
        }
        let description = description.into();

        let current_total = self.total_balance(currency);
        let new_total = current_total + total;

        let core_target_pct = 1.0
            - self
                .buckets
                .iter()
                .filter(|bucket| !bucket.id.is_core())
                .filter_map(|bucket| bucket.target_pct)
                .sum::<f64>();
        let core_target_amount = decimal_from_f64(new_total, core_target_pct);
        let core_balance = self.get_balance(&BucketId::core(), currency);
        let core_need = (core_target_amount - core_balance).max(Decimal::ZERO).min(total);

        let mut allocations: IndexMap<BucketId, Decimal> = IndexMap::new();
        let mut remaining = total - core_need;
        if !core_need.is_zero() {
            allocations.insert(BucketId::core(), core_need);
        }

        if !remaining.is_zero() {
            let satellite_deficits: Vec<(BucketId, Decimal)> = self
                .buckets
                .iter()
                .filter(|bucket| {
                    !bucket.id.is_core()
                        && matches!(bucket.status, BucketStatus::Active | BucketStatus::Accumulating)
                })
                .filter_map(|bucket| {
                    let target_pct = bucket.target_pct?;
                    let target_amount = decimal_from_f64(new_total, target_pct);
                    let current = self.get_balance(&bucket.id, currency);
                    let deficit = (target_amount - current).max(Decimal::ZERO);
                    Some((bucket.id.clone(), deficit))
                })
                .filter(|(_, deficit)| !deficit.is_zero())
                .collect();

            let deficit_sum: Decimal = satellite_deficits.iter().map(|(_, deficit)| *deficit).sum();
            if !deficit_sum.is_zero() {
                for (bucket_id, deficit) in &satellite_deficits {
                    let share = (*deficit / deficit_sum).min(Decimal::ONE) * remaining;
                    let share = share.min(remaining);
                    if !share.is_zero() {
                        *allocations.entry(bucket_id.clone()).or_insert(Decimal::ZERO) += share;
                        remaining -= share;
                    }
                }
            }
        }

        if !remaining.is_zero() {
            *allocations.entry(BucketId::core()).or_insert(Decimal::ZERO) += remaining;
        }

        self.with_tx(|ledger| {
            for (bucket_id, amount) in &allocations {
                ledger.adjust(bucket_id, currency, *amount);
                ledger.append(
                    bucket_id,
                    TransactionKind::Deposit,
                    *amount,
                    currency,
                    description.clone(),
                );
            }
            Ok(())
        })?;

        Ok(allocations)
    }

    /// `reconcile(currency, broker_amount, tolerance)`.
    ///
    /// Within tolerance, silently adjusts `core` and journals a
    /// `reallocation` entry. Beyond tolerance, refuses to mutate and reports
    /// a diagnostic — an operator must investigate.
    pub fn reconcile(
        &mut self,
        currency: &Currency,
        broker_amount: Decimal,
        tolerance: Decimal,
    ) -> Result<ReconcileOutcome, GlidepathError> {
        let ledger_total = self.total_balance(currency);
        let delta = broker_amount - ledger_total;
        if delta.abs() > tolerance {
            return Err(GlidepathError::ReconciliationDiscrepancyLarge {
                currency: currency.to_string(),
                delta: delta.to_string(),
                tolerance: tolerance.to_string(),
            });
        }
        if delta.is_zero() {
            return Ok(ReconcileOutcome {
                is_reconciled: true,
                adjustment: Decimal::ZERO,
            });
        }
        self.with_tx(|ledger| {
            ledger.adjust(&BucketId::core(), currency, delta);
            ledger.append(
                &BucketId::core(),
                TransactionKind::Reallocation,
                delta,
                currency,
                format!("reconciliation adjustment against broker balance {broker_amount}"),
            );
            Ok(())
        })?;
        Ok(ReconcileOutcome {
            is_reconciled: true,
            adjustment: delta,
        })
    }

    /// `initialize_from_broker(balances)` — first-run bootstrap: assigns all
    /// broker cash to `core`.
    pub fn initialize_from_broker(&mut self, balances: &[(Currency, Decimal)]) -> Result<(), GlidepathError> {
        self.with_tx(|ledger| {
            for (currency, amount) in balances {
                if amount.is_zero() {
                    continue;
                }
                ledger.adjust(&BucketId::core(), currency, *amount);
                ledger.append(
                    &BucketId::core(),
                    TransactionKind::Deposit,
                    *amount,
                    currency,
                    "initial broker balance",
                );
            }
            Ok(())
        })
    }

    /// `force_reconcile_to_core(currency, broker_amount)` — recovery
    /// operation. Sets `core = broker_amount − Σ non_core`; always succeeds.
    pub fn force_reconcile_to_core(&mut self, currency: &Currency, broker_amount: Decimal) {
        let non_core: Decimal = self
            .get_breakdown(currency)
            .iter()
            .filter(|(bucket, _)| !bucket.is_core())
            .map(|(_, amount)| *amount)
            .sum();
        let new_core = broker_amount - non_core;
        let current_core = self.get_balance(&BucketId::core(), currency);
        let delta = new_core - current_core;
        self.adjust(&BucketId::core(), currency, delta);
        self.append(
            &BucketId::core(),
            TransactionKind::Reallocation,
            delta,
            currency,
            format!("forced reconciliation to broker balance {broker_amount}"),
        );
    }

    pub fn min_currency_reserve(&self) -> Decimal {
        self.min_currency_reserve
    }
}

fn decimal_from_f64(base: Decimal, pct: f64) -> Decimal {
    base * Decimal::try_from(pct).unwrap_or(Decimal::ZERO)
}
