//! Seam traits for the external collaborators of the pipeline.
//!
//! The core treats page fetching, URL discovery, and semantic
//! extraction as opaque services: production implementations live in
//! [`crate::fetch`] and [`crate::extract`], and
//! [`crate::testing`] provides mocks so the reconciliation subsystem
//! is testable without a network or an LLM.

use async_trait::async_trait;

use crate::error::{ExtractResult, FetchResult};
use crate::types::EventDraft;

/// Fetches the raw text content of a single page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<String>;
}

/// Discovers candidate detail-page URLs from a listing page.
///
/// Returns a deduplicated list; the pipeline merges it with the URLs
/// it already tracks.
#[async_trait]
pub trait UrlDiscovery: Send + Sync {
    async fn discover(&self, listing_url: &str, keywords: &[String]) -> FetchResult<Vec<String>>;
}

/// Context handed to the extractor alongside page content.
#[derive(Debug, Clone)]
pub struct ExtractionContext<'a> {
    /// Artist the monitored source belongs to
    pub artist: &'a str,

    /// Detail page the content came from
    pub source_url: &'a str,
}

/// Extracts structured event proposals from page content.
///
/// Implementations are free to return zero drafts for pages with
/// nothing relevant; an `Err` means the page should be retried on a
/// later run (its fingerprint is not committed).
#[async_trait]
pub trait EventExtractor: Send + Sync {
    async fn extract(
        &self,
        content: &str,
        ctx: &ExtractionContext<'_>,
    ) -> ExtractResult<Vec<EventDraft>>;
}
