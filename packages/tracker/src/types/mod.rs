//! Domain types: events, detail pages, and run configuration.

pub mod config;
pub mod event;

pub use config::{ArtistConfig, RunConfig, SourceConfig};
pub use event::{
    parse_event_date, Event, EventDraft, EventKind, TicketPriority, TicketRequirement,
};
