//! The outbound pub/sub channel (§6 "Outbound events"):
//! `{planning_started, planning_progress{top_k_preview}, planning_complete,
//! planning_failed, trade_executed, recommendation_created}`, each carrying
//! a monotonically increasing [`Sequence`](glidepath_core::Sequence) so a
//! subscriber can detect gaps in best-effort delivery.
//!
//! Built on `tokio::sync::broadcast`: fan out to N independent subscribers,
//! at the cost that a late joiner misses whatever was published before it
//! subscribed.

use glidepath_core::error::CycleOutcome;
use glidepath_core::hash::PortfolioHash;
use glidepath_core::plan::SequenceEvaluation;
use glidepath_core::trade::Trade;
use glidepath_core::Sequence;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default channel capacity. Matches the coordinator's default top-K (10):
/// a slow subscriber can fall behind by a couple of full cycles before
/// `broadcast` starts dropping the oldest message.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningProgress {
    pub portfolio_hash: String,
    pub tranche_index: usize,
    /// The improving top-K snapshot as of this tranche (§4.6 "Incremental
    /// batch mode").
    pub top_k_preview: Vec<SequenceEvaluation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanningEvent {
    PlanningStarted {
        portfolio_hash: String,
    },
    PlanningProgress(PlanningProgress),
    PlanningComplete {
        portfolio_hash: String,
        outcome: CycleOutcome,
        top_k: Vec<SequenceEvaluation>,
    },
    PlanningFailed {
        portfolio_hash: String,
        reason: String,
    },
    TradeExecuted {
        trade: Trade,
    },
    RecommendationCreated {
        portfolio_hash: String,
        rank: usize,
    },
}

/// One wire envelope: the event plus its sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub sequence: Sequence,
    pub event: PlanningEvent,
}

/// Best-effort broadcast bus. `publish` never fails the caller even when
/// nobody is subscribed — outbound events are fire-and-forget by design.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<SequencedEvent>,
    next: Sequence,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            next: Sequence(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequencedEvent> {
        self.tx.subscribe()
    }

    /// Stamps `event` with the next sequence number and publishes it.
    /// Returns the assigned sequence number regardless of whether any
    /// subscriber was listening.
    pub fn publish(&mut self, event: PlanningEvent) -> Sequence {
        let sequence = self.next.fetch_add();
        let _ = self.tx.send(SequencedEvent { sequence, event });
        sequence
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

pub fn portfolio_hash_key(hash: &PortfolioHash) -> String {
    hash.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_assigns_monotonically_increasing_sequence_numbers() {
        let mut bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let first = bus.publish(PlanningEvent::PlanningStarted {
            portfolio_hash: "abc".to_string(),
        });
        let second = bus.publish(PlanningEvent::PlanningFailed {
            portfolio_hash: "abc".to_string(),
            reason: "busy".to_string(),
        });
        assert_eq!(first.value() + 1, second.value());

        let received_first = rx.try_recv().unwrap();
        let received_second = rx.try_recv().unwrap();
        assert_eq!(received_first.sequence, first);
        assert_eq!(received_second.sequence, second);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic_or_error() {
        let mut bus = EventBus::new(8);
        let sequence = bus.publish(PlanningEvent::PlanningStarted {
            portfolio_hash: "abc".to_string(),
        });
        assert_eq!(sequence.value(), 0);
    }
}
