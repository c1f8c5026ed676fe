//! Event store reconciliation and lifecycle maintenance.
//!
//! The store grows monotonically: incoming events are upserted by id,
//! existing records keep their first-seen timestamp, and nothing is
//! ever deleted, so past events remain for audit. Every
//! reconciliation also recomputes the ended flag for the whole store
//! from the current wall clock, because elapsed time affects records
//! no run has touched.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::types::Event;

/// Ordered collection of events keyed by id.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap previously persisted events.
    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Standalone (non-ticket-phase) events, as cross-run resolution
    /// candidates.
    pub fn standalone_events(&self) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| !e.is_ticket_phase())
            .cloned()
            .collect()
    }
}

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileSummary {
    pub added: usize,
    pub updated: usize,
    /// Events that transitioned active → ended this pass
    pub newly_ended: usize,
    /// Events that flipped back to active (date corrected forward)
    pub reactivated: usize,
    pub total: usize,
}

/// Merge a batch into the store, refresh every record's lifecycle,
/// and sort for presentation (active first, then ascending by date).
///
/// Upserts by id: an existing record has its extraction-derived
/// fields replaced in place, keeping the original `first_seen`;
/// unknown ids are appended. Records are never removed.
pub fn reconcile(
    store: &mut EventStore,
    batch: Vec<Event>,
    now: DateTime<Utc>,
) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    for incoming in batch {
        match store.events.iter_mut().find(|e| e.id == incoming.id) {
            Some(existing) => {
                let first_seen = existing.first_seen;
                *existing = incoming;
                existing.first_seen = first_seen;
                existing.last_seen = now;
                summary.updated += 1;
                debug!(id = %existing.id, "Updated existing event");
            }
            None => {
                let mut event = incoming;
                event.last_seen = now;
                debug!(id = %event.id, "Added new event");
                store.events.push(event);
                summary.added += 1;
            }
        }
    }

    let (newly_ended, reactivated) = refresh_lifecycle(store, now);
    summary.newly_ended = newly_ended;
    summary.reactivated = reactivated;

    store
        .events
        .sort_by(|a, b| a.ended.cmp(&b.ended).then(a.date.cmp(&b.date)));

    summary.total = store.events.len();
    info!(
        added = summary.added,
        updated = summary.updated,
        newly_ended = summary.newly_ended,
        total = summary.total,
        "Reconciled event store"
    );

    summary
}

/// Recompute `ended` for every stored event from the current time.
///
/// Not a sticky flag: a record whose date was corrected forward by a
/// later extraction flips back to active here. Returns
/// (newly ended, reactivated) counts.
pub fn refresh_lifecycle(store: &mut EventStore, now: DateTime<Utc>) -> (usize, usize) {
    let now_naive = now.naive_utc();
    let mut newly_ended = 0;
    let mut reactivated = 0;

    for event in &mut store.events {
        let ended = event.effective_stop_date() < now_naive;
        if ended && !event.ended {
            newly_ended += 1;
        } else if !ended && event.ended {
            reactivated += 1;
        }
        event.ended = ended;
    }

    (newly_ended, reactivated)
}
