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

//! # Glidepath Integration
//!
//! Ambient cross-cutting plumbing shared by every component, but owned by
//! none of them: the outbound pub/sub [`event`] bus (§6 "Outbound events")
//! and the copy-on-read [`snapshot`] types the concurrency model requires
//! (§5 "Shared resource policy").
//!
//! Also carries small generic collection helpers ([`collection`]) used
//! throughout the workspace wherever a field is "one, or possibly several"
//! or "zero, one, or several" rather than always a `Vec`.
//!
//! Low-level glue the rest of the workspace builds on: no component owns
//! the event bus or the snapshot types, so they live here instead of being
//! duplicated or awkwardly homed in one of the C1-C6 crates.

pub mod collection;
pub mod error;
pub mod event;
pub mod snapshot;

pub use error::IntegrationError;
pub use event::{EventBus, PlanningEvent, PlanningProgress, SequencedEvent};
pub use snapshot::{Snapshot, WeakCache};

/// Determines if something is considered "unrecoverable", such as an
/// unrecoverable error. Meaning varies by context; the coordinator uses it
/// to distinguish a retryable external-collaborator failure from one that
/// should abort the cycle outright.
pub trait Unrecoverable {
    fn is_unrecoverable(&self) -> bool;
}

/// Communicates if something is terminal (e.g. requires the coordinator to
/// give up on the current cycle rather than retry).
pub trait Terminal {
    fn is_terminal(&self) -> bool;
}
