//! Configuration types for monitored sources and pipeline runs.

use serde::{Deserialize, Serialize};

/// One monitored listing page for an artist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable identifier used in state records and logs
    pub id: String,

    /// Listing page enumerating links to detail pages
    pub url: String,

    /// Keywords a candidate link must match to be followed
    #[serde(default)]
    pub filter_keywords: Vec<String>,

    /// Cap on newly discovered detail pages per run
    #[serde(default = "default_max_detail_pages")]
    pub max_detail_pages: usize,
}

fn default_max_detail_pages() -> usize {
    10
}

impl SourceConfig {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            filter_keywords: Vec::new(),
            max_detail_pages: default_max_detail_pages(),
        }
    }

    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.filter_keywords = keywords.into_iter().map(|k| k.into()).collect();
        self
    }

    pub fn with_max_detail_pages(mut self, max: usize) -> Self {
        self.max_detail_pages = max;
        self
    }
}

/// An artist with one or more monitored sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistConfig {
    pub name: String,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// Settings for a pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Concurrent fetch+extract tasks per source
    pub concurrency: usize,

    /// Bypass fingerprint comparison and reprocess every known URL
    pub force: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            force: false,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}
