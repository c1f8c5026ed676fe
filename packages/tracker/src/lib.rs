//! Periodic monitoring of artist event pages.
//!
//! The pipeline fetches configured detail pages, fingerprints their
//! content with SHA-256 to skip unchanged pages, runs a semantic
//! extractor over the changed ones, links ticket phases (lotteries and
//! sales) to their parent events, and reconciles everything into a
//! persistent store under deterministic identifiers. Repeated runs
//! over the same content converge: no duplicates, no lost history.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tracker::{pipeline, ArtistConfig, EventStore, ExactTitleResolver,
//!     FetchState, HtmlLinkDiscovery, HttpFetcher, OpenAiExtractor,
//!     RunConfig, SourceConfig};
//!
//! let artists = vec![ArtistConfig {
//!     name: "MyGO!!!!!".into(),
//!     sources: vec![SourceConfig::new("official-news", "https://band.example/news")],
//! }];
//!
//! let fetcher = HttpFetcher::new();
//! let discovery = HtmlLinkDiscovery::new(HttpFetcher::new());
//! let extractor = OpenAiExtractor::from_env()?;
//!
//! let mut state = FetchState::default();
//! let mut store = EventStore::new();
//! let summary = pipeline::run(
//!     &artists, &RunConfig::default(), &mut state, &mut store,
//!     &fetcher, &discovery, &extractor, &ExactTitleResolver,
//! ).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seam traits (PageFetcher, UrlDiscovery, EventExtractor)
//! - [`types`] - Event and configuration types
//! - [`pipeline`] - Run orchestration
//! - [`fingerprint`] - Content hashing and per-page fetch state
//! - [`ident`] - Deterministic event identifiers
//! - [`resolver`] - Parent resolution for ticket phases
//! - [`reconcile`] - Store reconciliation and lifecycle
//! - [`persist`] - Atomic JSON persistence
//! - [`fetch`] - HTTP implementations of the fetch traits
//! - [`extract`] - LLM-backed extractor implementations
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod extract;
pub mod fetch;
pub mod fingerprint;
pub mod ident;
pub mod persist;
pub mod pipeline;
pub mod reconcile;
pub mod resolver;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ExtractError, FetchError, StateError, TrackerError, ValidationError};
pub use extract::OpenAiExtractor;
pub use fetch::{HtmlLinkDiscovery, HttpFetcher};
pub use fingerprint::{fingerprint, DetailPageRecord, FetchState};
pub use ident::generate_event_id;
pub use persist::{load_events, load_state, save_events, save_state};
pub use pipeline::RunSummary;
pub use reconcile::{reconcile, EventStore, ReconcileSummary};
pub use resolver::{link_events, ExactTitleResolver, LinkReport, ParentResolver};
pub use traits::{EventExtractor, ExtractionContext, PageFetcher, UrlDiscovery};
pub use types::{
    ArtistConfig, Event, EventDraft, EventKind, RunConfig, SourceConfig, TicketPriority,
    TicketRequirement,
};

// Re-export testing utilities
pub use testing::{MockDiscovery, MockExtractor, MockFetcher};
