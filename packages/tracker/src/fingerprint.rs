//! Content fingerprinting and per-URL change tracking.
//!
//! Each detail page is tracked by a SHA-256 digest of its raw text.
//! A digest is committed to [`FetchState`] only after a successful
//! extraction over that content, so a failed extraction leaves the
//! stored digest untouched and the page is retried on the next run.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Compute the fingerprint of raw page content.
///
/// SHA-256 hex: identical content always produces identical digests,
/// any difference a different one.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Tracking record for one detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailPageRecord {
    pub url: String,

    /// Source this page was discovered through
    pub source_id: String,

    /// Digest of the content at the last successful extraction
    pub fingerprint: String,

    pub last_checked: DateTime<Utc>,

    /// Latest event date observed on the page; once passed, the page
    /// drops out of fetch cycles but the record is retained
    pub stop_date: Option<NaiveDateTime>,
}

/// Persisted fetch state: last run timestamp plus one record per
/// tracked URL.
///
/// Owned by the reconciliation subsystem: loaded at run start,
/// mutated during the run, persisted at run end. A `BTreeMap` keeps
/// the on-disk representation stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchState {
    pub last_run: Option<DateTime<Utc>>,

    #[serde(default)]
    pub pages: BTreeMap<String, DetailPageRecord>,
}

impl FetchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored digest for a URL, if the page has been extracted before.
    pub fn stored_fingerprint(&self, url: &str) -> Option<&str> {
        self.pages.get(url).map(|p| p.fingerprint.as_str())
    }

    /// Whether extraction is needed for this URL and digest.
    ///
    /// A URL with no stored digest counts as changed (first sighting).
    pub fn needs_extraction(&self, url: &str, current_digest: &str) -> bool {
        match self.stored_fingerprint(url) {
            Some(stored) => stored != current_digest,
            None => true,
        }
    }

    /// Record a successful extraction for a URL.
    ///
    /// Must be called only after extraction succeeded over this
    /// content; committing on the fetch alone would break the
    /// retry-on-failure guarantee.
    pub fn commit(
        &mut self,
        url: &str,
        source_id: &str,
        digest: String,
        now: DateTime<Utc>,
        stop_date: Option<NaiveDateTime>,
    ) {
        self.pages.insert(
            url.to_string(),
            DetailPageRecord {
                url: url.to_string(),
                source_id: source_id.to_string(),
                fingerprint: digest,
                last_checked: now,
                stop_date,
            },
        );
    }

    /// Known URLs for a source that are still worth fetching.
    ///
    /// A page stays active while its stop date is unset or in the
    /// future; expired pages keep their record but are skipped.
    pub fn active_urls(&self, source_id: &str, now: DateTime<Utc>) -> Vec<String> {
        self.pages
            .values()
            .filter(|p| p.source_id == source_id)
            .filter(|p| match p.stop_date {
                Some(stop) => stop > now.naive_utc(),
                None => true,
            })
            .map(|p| p.url.clone())
            .collect()
    }
}
