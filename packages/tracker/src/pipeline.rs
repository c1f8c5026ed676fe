//! Run orchestration: fetch, fingerprint check, extract, resolve,
//! reconcile, per monitored source.
//!
//! Independent detail pages of a source are fetched and extracted
//! concurrently under a configurable limit. Parent resolution waits
//! for the whole source batch, since a child's parent may sit on a
//! sibling page, and all state mutation happens in a serialized
//! section afterwards. A failure on one URL never touches the others,
//! and because fingerprints are committed only after successful
//! extraction, an interrupted run leaves resumable state behind.

use chrono::{DateTime, NaiveDateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fingerprint::{fingerprint, FetchState};
use crate::reconcile::{reconcile, EventStore, ReconcileSummary};
use crate::resolver::{link_events, ParentResolver};
use crate::traits::{EventExtractor, ExtractionContext, PageFetcher, UrlDiscovery};
use crate::types::{ArtistConfig, Event, RunConfig, SourceConfig};

/// Counts from one full pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sources_processed: usize,
    pub pages_checked: usize,
    pub pages_skipped: usize,
    pub pages_failed: usize,
    pub events_extracted: usize,
    /// Malformed records dropped during draft conversion
    pub records_dropped: usize,
    /// Ticket phases persisted without a resolved parent
    pub unlinked_phases: usize,
    pub reconcile: ReconcileSummary,
}

/// Result of processing a single detail page.
enum PageOutcome {
    /// Content unchanged since the last successful extraction
    Skipped,
    /// Fetch or extraction failed; fingerprint left untouched
    Failed,
    Extracted {
        url: String,
        digest: String,
        events: Vec<Event>,
        dropped: usize,
    },
}

/// Run the full pipeline over every configured artist and source,
/// then reconcile the accumulated batch into the store.
pub async fn run<F, D, E>(
    artists: &[ArtistConfig],
    config: &RunConfig,
    state: &mut FetchState,
    store: &mut EventStore,
    fetcher: &F,
    discovery: &D,
    extractor: &E,
    resolver: &dyn ParentResolver,
) -> Result<RunSummary>
where
    F: PageFetcher,
    D: UrlDiscovery,
    E: EventExtractor,
{
    let now = Utc::now();
    let mut summary = RunSummary::default();
    let mut batch: Vec<Event> = Vec::new();

    for artist in artists {
        for source in &artist.sources {
            info!(artist = %artist.name, source = %source.id, "Processing source");

            let mut events =
                run_source(&artist.name, source, config, state, fetcher, discovery, extractor, now, &mut summary)
                    .await;

            // Join barrier: every page of this source has completed,
            // so cross-page references can now be resolved.
            let prior = store.standalone_events();
            let report = link_events(&mut events, &prior, resolver);
            summary.unlinked_phases += report.unlinked.len();

            summary.events_extracted += events.len();
            summary.sources_processed += 1;
            batch.extend(events);
        }
    }

    // Serialized critical section: single writer to state and store.
    summary.reconcile = reconcile(store, batch, now);
    state.last_run = Some(now);

    info!(
        sources = summary.sources_processed,
        pages = summary.pages_checked,
        skipped = summary.pages_skipped,
        failed = summary.pages_failed,
        events = summary.events_extracted,
        "Run complete"
    );

    Ok(summary)
}

/// Process one source: merge known and discovered URLs, then fetch
/// and extract concurrently. Fingerprint commits happen here, after
/// the concurrent section, only for pages whose extraction succeeded.
#[allow(clippy::too_many_arguments)]
async fn run_source<F, D, E>(
    artist: &str,
    source: &SourceConfig,
    config: &RunConfig,
    state: &mut FetchState,
    fetcher: &F,
    discovery: &D,
    extractor: &E,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Vec<Event>
where
    F: PageFetcher,
    D: UrlDiscovery,
    E: EventExtractor,
{
    let known = state.active_urls(&source.id, now);

    let discovered = match discovery.discover(&source.url, &source.filter_keywords).await {
        Ok(mut urls) => {
            urls.truncate(source.max_detail_pages);
            urls
        }
        Err(e) => {
            // The listing page is just another URL: its failure costs
            // this run's discoveries, not the known pages.
            warn!(source = %source.id, error = %e, "URL discovery failed; using known pages only");
            Vec::new()
        }
    };

    let mut seen = std::collections::HashSet::new();
    let urls: Vec<(String, Option<String>)> = known
        .into_iter()
        .chain(discovered)
        .filter(|url| seen.insert(url.clone()))
        .map(|url| {
            let stored = state.stored_fingerprint(&url).map(str::to_string);
            (url, stored)
        })
        .collect();

    debug!(source = %source.id, pages = urls.len(), "Pages to check");
    summary.pages_checked += urls.len();

    let outcomes: Vec<PageOutcome> = stream::iter(urls.into_iter().map(|(url, stored)| {
        process_page(url, stored, config.force, artist, fetcher, extractor, now)
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    let mut events = Vec::new();
    for outcome in outcomes {
        match outcome {
            PageOutcome::Skipped => summary.pages_skipped += 1,
            PageOutcome::Failed => summary.pages_failed += 1,
            PageOutcome::Extracted {
                url,
                digest,
                events: page_events,
                dropped,
            } => {
                summary.records_dropped += dropped;
                // Commit strictly after successful extraction, with
                // the latest event date as the page's stop date.
                let stop_date = max_event_date(&page_events);
                state.commit(&url, &source.id, digest, now, stop_date);
                events.extend(page_events);
            }
        }
    }

    events
}

/// Fetch, compare, and extract one detail page.
async fn process_page<F, E>(
    url: String,
    stored_digest: Option<String>,
    force: bool,
    artist: &str,
    fetcher: &F,
    extractor: &E,
    now: DateTime<Utc>,
) -> PageOutcome
where
    F: PageFetcher,
    E: EventExtractor,
{
    let content = match fetcher.fetch(&url).await {
        Ok(content) => content,
        Err(e) => {
            warn!(url = %url, error = %e, "Fetch failed; page will be retried next run");
            return PageOutcome::Failed;
        }
    };

    let digest = fingerprint(&content);
    if !force && stored_digest.as_deref() == Some(digest.as_str()) {
        debug!(url = %url, "Content unchanged, skipping extraction");
        return PageOutcome::Skipped;
    }

    let status = if stored_digest.is_some() { "changed" } else { "new" };
    debug!(url = %url, status, "Extracting events");

    let ctx = ExtractionContext {
        artist,
        source_url: &url,
    };
    match extractor.extract(&content, &ctx).await {
        Ok(drafts) => {
            let mut events = Vec::with_capacity(drafts.len());
            let mut dropped = 0;
            for draft in drafts {
                match Event::from_draft(draft, artist, &url, now) {
                    Ok(event) => events.push(event),
                    Err(e) => {
                        warn!(url = %url, error = %e, "Dropping invalid event record");
                        dropped += 1;
                    }
                }
            }
            PageOutcome::Extracted {
                url,
                digest,
                events,
                dropped,
            }
        }
        Err(e) => {
            // Fingerprint deliberately not committed: identical
            // content must retry extraction next run.
            warn!(url = %url, error = %e, "Extraction failed; fingerprint not committed");
            PageOutcome::Failed
        }
    }
}

fn max_event_date(events: &[Event]) -> Option<NaiveDateTime> {
    events.iter().map(|e| e.date).max()
}
