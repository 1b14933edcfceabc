use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use core_model::{Execution, Opportunity};
use store::Alert;

/// One frame of the streaming channel (§6): `{seq, type, payload}`. `seq` is
/// a single monotonically increasing counter shared by every event type, so
/// a resuming client can ask for "everything after seq N" regardless of
/// which types it cares about.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EventKind {
    OpportunityUpsert(Opportunity),
    OpportunityRetire { id: String },
    ExecutionTransition(Execution),
    Alert(Alert),
}

#[derive(Clone, Debug, Serialize)]
pub struct Event {
    pub seq: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Sequenced, at-least-once event feed (§4.H), grounded on
/// `backend/src/main.rs::start_market_feed`'s `mpsc`-based metrics fan-out
/// but widened to `broadcast` since telemetry consumers are multiple and
/// independent rather than a single executor pipeline. Late subscribers
/// missing buffered frames is the accepted at-least-once gap; `last_seq`
/// lets a client detect and request a resync out of band (the durable
/// `alerts`/`executions` tables back that resync, not this channel).
pub struct EventFeed {
    seq: AtomicU64,
    tx: broadcast::Sender<Event>,
}

impl EventFeed {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (tx, _) = broadcast::channel(capacity);
        Arc::new(Self { seq: AtomicU64::new(0), tx })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn last_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    fn publish(&self, kind: EventKind) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        // A lagging subscriber dropping a frame is not an error here: the
        // channel has no receivers at all only during startup.
        let _ = self.tx.send(Event { seq, kind });
    }

    pub fn opportunity_upsert(&self, opp: Opportunity) {
        self.publish(EventKind::OpportunityUpsert(opp));
    }

    pub fn opportunity_retire(&self, id: impl Into<String>) {
        self.publish(EventKind::OpportunityRetire { id: id.into() });
    }

    pub fn execution_transition(&self, exec: Execution) {
        self.publish(EventKind::ExecutionTransition(exec));
    }

    pub fn alert(&self, alert: Alert) {
        self.publish(EventKind::Alert(alert));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::AlertSeverity;

    #[tokio::test]
    async fn sequence_numbers_increase_monotonically_across_event_types() {
        let feed = EventFeed::new(16);
        let mut rx = feed.subscribe();

        feed.opportunity_retire("o1");
        feed.alert(Alert { id: "a1".into(), ts_ms: 0, severity: AlertSeverity::Info, message: "x".into() });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(feed.last_seq(), 2);
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive_every_frame() {
        let feed = EventFeed::new(16);
        let mut rx1 = feed.subscribe();
        let mut rx2 = feed.subscribe();

        feed.opportunity_retire("o1");

        assert_eq!(rx1.recv().await.unwrap().seq, 1);
        assert_eq!(rx2.recv().await.unwrap().seq, 1);
    }

    #[tokio::test]
    async fn publish_before_any_subscriber_does_not_panic() {
        let feed = EventFeed::new(16);
        feed.opportunity_retire("o1");
        assert_eq!(feed.last_seq(), 1);
    }
}
