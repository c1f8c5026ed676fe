//! In-memory mock implementations of the pipeline's seam traits.
//!
//! Used by this crate's own tests and available to downstream tests
//! that want to drive the pipeline without a network or an LLM. All
//! mocks record their calls so tests can assert on skip and retry
//! behavior.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{ExtractError, ExtractResult, FetchError, FetchResult};
use crate::traits::{EventExtractor, ExtractionContext, PageFetcher, UrlDiscovery};
use crate::types::EventDraft;

/// Serves canned page content by URL; unknown URLs return a 404.
#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, String>>>,
    failures: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, content: impl Into<String>) -> Self {
        self.set_page(url, content);
        self
    }

    /// Mark a URL as failing with a server error.
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.failures.write().unwrap().insert(url.into());
        self
    }

    /// Replace a page's content after construction, to simulate an
    /// update between runs.
    pub fn set_page(&self, url: impl Into<String>, content: impl Into<String>) {
        self.pages.write().unwrap().insert(url.into(), content.into());
    }

    /// Clear a previously configured failure.
    pub fn clear_failure(&self, url: &str) {
        self.failures.write().unwrap().remove(url);
    }

    /// How many times a URL has been fetched.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.calls.read().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        self.calls.write().unwrap().push(url.to_string());

        if self.failures.read().unwrap().contains(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            });
        }
        match self.pages.read().unwrap().get(url) {
            Some(content) => Ok(content.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Returns a fixed URL list per listing URL, ignoring keywords.
#[derive(Clone, Default)]
pub struct MockDiscovery {
    listings: Arc<RwLock<HashMap<String, Vec<String>>>>,
    failures: Arc<RwLock<HashSet<String>>>,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(self, listing_url: impl Into<String>, urls: Vec<String>) -> Self {
        self.set_listing(listing_url, urls);
        self
    }

    pub fn with_failure(self, listing_url: impl Into<String>) -> Self {
        self.failures.write().unwrap().insert(listing_url.into());
        self
    }

    pub fn set_listing(&self, listing_url: impl Into<String>, urls: Vec<String>) {
        self.listings.write().unwrap().insert(listing_url.into(), urls);
    }
}

#[async_trait]
impl UrlDiscovery for MockDiscovery {
    async fn discover(&self, listing_url: &str, _keywords: &[String]) -> FetchResult<Vec<String>> {
        if self.failures.read().unwrap().contains(listing_url) {
            return Err(FetchError::Status {
                url: listing_url.to_string(),
                status: 503,
            });
        }
        Ok(self
            .listings
            .read()
            .unwrap()
            .get(listing_url)
            .cloned()
            .unwrap_or_default())
    }
}

/// Returns canned drafts keyed by the page's source URL.
#[derive(Clone, Default)]
pub struct MockExtractor {
    responses: Arc<RwLock<HashMap<String, Vec<EventDraft>>>>,
    failures: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drafts(self, source_url: impl Into<String>, drafts: Vec<EventDraft>) -> Self {
        self.set_drafts(source_url, drafts);
        self
    }

    /// Mark a page's extraction as failing.
    pub fn with_failure(self, source_url: impl Into<String>) -> Self {
        self.failures.write().unwrap().insert(source_url.into());
        self
    }

    pub fn set_drafts(&self, source_url: impl Into<String>, drafts: Vec<EventDraft>) {
        self.responses.write().unwrap().insert(source_url.into(), drafts);
    }

    pub fn clear_failure(&self, source_url: &str) {
        self.failures.write().unwrap().remove(source_url);
    }

    /// How many times extraction ran for a page. The pipeline's skip
    /// and retry behavior is asserted through this.
    pub fn extract_count(&self, source_url: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|u| *u == source_url)
            .count()
    }
}

#[async_trait]
impl EventExtractor for MockExtractor {
    async fn extract(
        &self,
        _content: &str,
        ctx: &ExtractionContext<'_>,
    ) -> ExtractResult<Vec<EventDraft>> {
        self.calls.write().unwrap().push(ctx.source_url.to_string());

        if self.failures.read().unwrap().contains(ctx.source_url) {
            return Err(ExtractError::Api("mock extraction failure".into()));
        }
        Ok(self
            .responses
            .read()
            .unwrap()
            .get(ctx.source_url)
            .cloned()
            .unwrap_or_default())
    }
}
