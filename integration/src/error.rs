//! Errors raised by this crate's ambient plumbing (event bus, snapshots).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    /// A `broadcast` publish found no active subscribers. Best-effort
    /// delivery (§6 "Outbound events"): this is not escalated as a failure,
    /// but callers that care can observe it.
    #[error("no subscribers currently listening for outbound events")]
    NoSubscribers,
}
