//! The trade-executor handoff (§4.6 "Execute path"): once a caller selects
//! a pending recommendation, the coordinator hands its actions to this
//! collaborator and never itself calls the broker.

use async_trait::async_trait;
use glidepath_core::plan::ActionCandidate;
use glidepath_core::trade::Trade;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("executor rejected action: {0}")]
    Rejected(String),
    #[error("executor unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TradeExecutor: Send + Sync {
    /// Executes one recommendation's actions in order, stopping at the
    /// first rejection (the coordinator does not retry a partially
    /// executed sequence itself — that is this collaborator's call).
    async fn execute(&self, actions: &[ActionCandidate]) -> Result<Vec<Trade>, ExecutorError>;
}
