//! Parent resolution for ticket-phase events.
//!
//! A lottery or sale is a child of a standalone event, but the two
//! are often discovered on different pages or in different runs. The
//! resolver matches a child's source-supplied parent reference
//! against standalone events from the current batch first, then
//! against previously persisted ones, and anchors the child's id to
//! the parent's title and date so every observation of the child
//! converges on the same identifier.

use tracing::{debug, warn};

use crate::ident::generate_event_id;
use crate::types::Event;

/// Matching strategy for parent references.
///
/// Title matching is inherently fuzzy; keeping it behind a trait lets
/// the strategy evolve (similarity scoring, explicit id hints)
/// without touching the reconciler.
pub trait ParentResolver: Send + Sync {
    /// Find the standalone event a reference string names.
    fn resolve<'a>(&self, reference: &str, candidates: &'a [Event]) -> Option<&'a Event>;
}

/// Case-insensitive, whitespace-normalized exact title equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTitleResolver;

impl ParentResolver for ExactTitleResolver {
    fn resolve<'a>(&self, reference: &str, candidates: &'a [Event]) -> Option<&'a Event> {
        let needle = normalize_for_match(reference);
        candidates
            .iter()
            .find(|e| normalize_for_match(&e.title) == needle)
    }
}

/// Collapse whitespace runs and lowercase for comparison.
fn normalize_for_match(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Outcome of linking one batch.
#[derive(Debug, Clone, Default)]
pub struct LinkReport {
    /// Ticket phases linked to a parent
    pub resolved: usize,

    /// Ids of ticket phases left without a parent (persisted anyway)
    pub unlinked: Vec<String>,
}

/// Assign identifiers and resolve parent references across a batch.
///
/// Standalone events get their ids first; each ticket phase is then
/// resolved same-run, falling back to `prior_standalone` (previously
/// persisted standalone events) for cross-run references. A resolved
/// phase regenerates its id from the parent's title and date combined
/// with its own dimensions. An unresolved reference is a warning, not
/// an error: the phase keeps an id derived from its own fields and is
/// persisted unlinked.
pub fn link_events(
    batch: &mut [Event],
    prior_standalone: &[Event],
    resolver: &dyn ParentResolver,
) -> LinkReport {
    // Standalone events first, so phases have ids to reference.
    for event in batch.iter_mut() {
        if !event.is_ticket_phase() {
            event.id = generate_event_id(&event.title, event.date, Some(event.kind), None, None);
        }
    }

    // Snapshot for same-run lookups while phases are mutated below.
    let same_run: Vec<Event> = batch
        .iter()
        .filter(|e| !e.is_ticket_phase())
        .cloned()
        .collect();

    let mut report = LinkReport::default();

    for event in batch.iter_mut() {
        if !event.is_ticket_phase() {
            continue;
        }

        let requirement = event.requirement.map(|r| r.as_str());
        let priority = event.priority.map(|p| p.as_str());

        let parent = event.parent_title.as_deref().and_then(|reference| {
            resolver
                .resolve(reference, &same_run)
                .or_else(|| resolver.resolve(reference, prior_standalone))
        });

        match parent {
            Some(parent) => {
                // Anchor the child's identity to the immutable parent:
                // parent's title and date, child's own dimensions.
                event.id = generate_event_id(
                    &parent.title,
                    parent.date,
                    Some(event.kind),
                    requirement,
                    priority,
                );
                event.parent_id = Some(parent.id.clone());
                report.resolved += 1;
                debug!(
                    child = %event.id,
                    parent = %parent.id,
                    "Resolved ticket phase parent"
                );
            }
            None => {
                event.id = generate_event_id(
                    &event.title,
                    event.date,
                    Some(event.kind),
                    requirement,
                    priority,
                );
                event.parent_id = None;
                if let Some(reference) = &event.parent_title {
                    warn!(
                        id = %event.id,
                        reference = %reference,
                        "Ticket phase parent not found; keeping event unlinked"
                    );
                }
                report.unlinked.push(event.id.clone());
            }
        }
    }

    report
}
