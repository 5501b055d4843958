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

//! # Glidepath External
//!
//! Interface-only contracts for every collaborator §1 places "OUT OF
//! SCOPE": the broker adapter, the risk-model endpoint, the market-data
//! endpoint, the trade executor, and the five persistent stores (§6). None
//! of these modules implement real connectivity — they pin down the shapes
//! the planning core codes against, isolating "what a client needs" from
//! "how the wire protocol actually works".
//!
//! ## Module map
//!
//! - [`broker`]: [`broker::BrokerAdapter`] — cash balances, positions,
//!   orders, quotes.
//! - [`risk_model`]: [`risk_model::RiskModelClient`] — the three
//!   JSON-over-HTTP calls C3 and C2 depend on, wrapped in the
//!   `{success, data, error, timestamp}` envelope.
//! - [`market_data`]: [`market_data::MarketDataClient`] — current price,
//!   fundamentals, and the macro signals C2's forward adjustment consumes.
//! - [`executor`]: [`executor::TradeExecutor`] — the handoff at the end of
//!   the coordinator's execute path.
//! - [`fx`]: the fixed FX pair table (§6) and conversion helper.
//! - [`persistence`]: the five logical stores' row shapes and the
//!   idempotent cash-flow sync contract.

pub mod broker;
pub mod executor;
pub mod fx;
pub mod market_data;
pub mod persistence;
pub mod risk_model;

pub use broker::{BrokerAdapter, BrokerError};
pub use executor::{ExecutorError, TradeExecutor};
pub use fx::{Currency, FxError, FxRates};
pub use market_data::{MacroSignals, MarketDataClient, MarketDataError};
pub use risk_model::{RiskModelClient, RiskModelError};
