//! End-to-end pipeline tests over the mock fetcher, discovery, and
//! extractor: change detection, retry, parent resolution across runs,
//! and store convergence.

use tracker::testing::{MockDiscovery, MockExtractor, MockFetcher};
use tracker::types::{ArtistConfig, EventDraft, RunConfig, SourceConfig};
use tracker::{pipeline, EventStore, ExactTitleResolver, FetchState};

const LISTING: &str = "https://band.example/news";
const LIVE_PAGE: &str = "https://band.example/live/9th";
const TICKET_PAGE: &str = "https://band.example/ticket/9th-lottery";

fn artist() -> Vec<ArtistConfig> {
    vec![ArtistConfig {
        name: "MyGO!!!!!".into(),
        sources: vec![SourceConfig::new("official-news", LISTING)],
    }]
}

fn live_draft() -> EventDraft {
    EventDraft {
        event_type: "live".into(),
        title: "MyGO!!!!! 9th LIVE".into(),
        date: Some("2031-07-18".into()),
        venue: Some("Zepp Haneda".into()),
        ..Default::default()
    }
}

fn lottery_draft() -> EventDraft {
    EventDraft {
        event_type: "lottery".into(),
        title: "MyGO!!!!! 9th LIVE 最速先行抽選".into(),
        date: Some("2031-03-06".into()),
        end_date: Some("2031-03-16".into()),
        parent_title: Some("MyGO!!!!! 9th LIVE".into()),
        ticket_requirement: Some("cd".into()),
        ticket_priority: Some("fastest".into()),
        action_required: true,
        action_deadline: Some("2031-03-16T23:59".into()),
        action_description: Some("Apply with the serial code from 8th Single".into()),
        ..Default::default()
    }
}

async fn run_once(
    fetcher: &MockFetcher,
    discovery: &MockDiscovery,
    extractor: &MockExtractor,
    config: &RunConfig,
    state: &mut FetchState,
    store: &mut EventStore,
) -> pipeline::RunSummary {
    pipeline::run(
        &artist(),
        config,
        state,
        store,
        fetcher,
        discovery,
        extractor,
        &ExactTitleResolver,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn unchanged_content_skips_extraction() {
    let fetcher = MockFetcher::new().with_page(LIVE_PAGE, "<html>9th LIVE details</html>");
    let discovery = MockDiscovery::new().with_listing(LISTING, vec![LIVE_PAGE.into()]);
    let extractor = MockExtractor::new().with_drafts(LIVE_PAGE, vec![live_draft()]);

    let config = RunConfig::default();
    let mut state = FetchState::new();
    let mut store = EventStore::new();

    let first = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;
    assert_eq!(first.reconcile.added, 1);
    assert_eq!(extractor.extract_count(LIVE_PAGE), 1);

    let second = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;
    assert_eq!(second.pages_skipped, 1);
    assert_eq!(second.reconcile.added, 0);
    // Fetched again, but not re-extracted
    assert_eq!(fetcher.fetch_count(LIVE_PAGE), 2);
    assert_eq!(extractor.extract_count(LIVE_PAGE), 1);
}

#[tokio::test]
async fn changed_content_reextracts_without_duplicating() {
    let fetcher = MockFetcher::new().with_page(LIVE_PAGE, "<html>v1</html>");
    let discovery = MockDiscovery::new().with_listing(LISTING, vec![LIVE_PAGE.into()]);
    let extractor = MockExtractor::new().with_drafts(LIVE_PAGE, vec![live_draft()]);

    let config = RunConfig::default();
    let mut state = FetchState::new();
    let mut store = EventStore::new();

    run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;

    // Cosmetic page update; extraction yields the same event.
    fetcher.set_page(LIVE_PAGE, "<html>v1, now with a typo fixed</html>");
    let second = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;

    assert_eq!(extractor.extract_count(LIVE_PAGE), 2);
    assert_eq!(second.reconcile.added, 0);
    assert_eq!(second.reconcile.updated, 1);
    assert_eq!(store.len(), 1);
    assert!(store.get("mygo-9th-live-2031-07-18").is_some());
}

#[tokio::test]
async fn failed_extraction_is_retried_next_run() {
    let fetcher = MockFetcher::new().with_page(LIVE_PAGE, "<html>9th LIVE</html>");
    let discovery = MockDiscovery::new().with_listing(LISTING, vec![LIVE_PAGE.into()]);
    let extractor = MockExtractor::new()
        .with_drafts(LIVE_PAGE, vec![live_draft()])
        .with_failure(LIVE_PAGE);

    let config = RunConfig::default();
    let mut state = FetchState::new();
    let mut store = EventStore::new();

    let first = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;
    assert_eq!(first.pages_failed, 1);
    assert!(store.is_empty());

    // Identical content next run: the digest was never committed, so
    // extraction runs again and now succeeds.
    extractor.clear_failure(LIVE_PAGE);
    let second = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;
    assert_eq!(extractor.extract_count(LIVE_PAGE), 2);
    assert_eq!(second.reconcile.added, 1);
}

#[tokio::test]
async fn fetch_failure_isolated_to_one_page() {
    let fetcher = MockFetcher::new()
        .with_page(LIVE_PAGE, "<html>9th LIVE</html>")
        .with_failure(TICKET_PAGE);
    let discovery = MockDiscovery::new()
        .with_listing(LISTING, vec![LIVE_PAGE.into(), TICKET_PAGE.into()]);
    let extractor = MockExtractor::new().with_drafts(LIVE_PAGE, vec![live_draft()]);

    let config = RunConfig::default();
    let mut state = FetchState::new();
    let mut store = EventStore::new();

    let summary = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.reconcile.added, 1);
    assert!(store.get("mygo-9th-live-2031-07-18").is_some());
}

#[tokio::test]
async fn ticket_phase_resolves_to_parent_from_previous_run() {
    let fetcher = MockFetcher::new().with_page(LIVE_PAGE, "<html>9th LIVE</html>");
    let discovery = MockDiscovery::new().with_listing(LISTING, vec![LIVE_PAGE.into()]);
    let extractor = MockExtractor::new().with_drafts(LIVE_PAGE, vec![live_draft()]);

    let config = RunConfig::default();
    let mut state = FetchState::new();
    let mut store = EventStore::new();

    run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;

    // A week later the lottery is announced on its own page.
    fetcher.set_page(TICKET_PAGE, "<html>最速先行抽選 受付</html>");
    discovery.set_listing(LISTING, vec![LIVE_PAGE.into(), TICKET_PAGE.into()]);
    extractor.set_drafts(TICKET_PAGE, vec![lottery_draft()]);

    let second = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;
    assert_eq!(second.unlinked_phases, 0);
    assert_eq!(second.reconcile.added, 1);

    let child = store
        .get("mygo-9th-live-2031-07-18-lottery-cd-fastest")
        .expect("phase anchored to the parent's title and date");
    assert_eq!(child.parent_id.as_deref(), Some("mygo-9th-live-2031-07-18"));
    assert!(child.action_required);
}

#[tokio::test]
async fn same_run_phase_and_parent_on_different_pages() {
    let fetcher = MockFetcher::new()
        .with_page(LIVE_PAGE, "<html>9th LIVE</html>")
        .with_page(TICKET_PAGE, "<html>最速先行抽選</html>");
    let discovery = MockDiscovery::new()
        .with_listing(LISTING, vec![LIVE_PAGE.into(), TICKET_PAGE.into()]);
    let extractor = MockExtractor::new()
        .with_drafts(LIVE_PAGE, vec![live_draft()])
        .with_drafts(TICKET_PAGE, vec![lottery_draft()]);

    let config = RunConfig::default();
    let mut state = FetchState::new();
    let mut store = EventStore::new();

    let summary = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;
    assert_eq!(summary.reconcile.added, 2);
    assert_eq!(summary.unlinked_phases, 0);

    let child = store.get("mygo-9th-live-2031-07-18-lottery-cd-fastest").unwrap();
    assert_eq!(child.parent_id.as_deref(), Some("mygo-9th-live-2031-07-18"));
}

#[tokio::test]
async fn force_mode_reprocesses_unchanged_pages() {
    let fetcher = MockFetcher::new().with_page(LIVE_PAGE, "<html>9th LIVE</html>");
    let discovery = MockDiscovery::new().with_listing(LISTING, vec![LIVE_PAGE.into()]);
    let extractor = MockExtractor::new().with_drafts(LIVE_PAGE, vec![live_draft()]);

    let mut state = FetchState::new();
    let mut store = EventStore::new();

    let normal = RunConfig::default();
    run_once(&fetcher, &discovery, &extractor, &normal, &mut state, &mut store).await;

    let forced = RunConfig::default().force();
    let second = run_once(&fetcher, &discovery, &extractor, &forced, &mut state, &mut store).await;
    assert_eq!(second.pages_skipped, 0);
    assert_eq!(extractor.extract_count(LIVE_PAGE), 2);
    // Still converges: update, not duplicate
    assert_eq!(second.reconcile.updated, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn discovery_failure_falls_back_to_known_pages() {
    let fetcher = MockFetcher::new().with_page(LIVE_PAGE, "<html>9th LIVE</html>");
    let discovery = MockDiscovery::new().with_listing(LISTING, vec![LIVE_PAGE.into()]);
    let extractor = MockExtractor::new().with_drafts(LIVE_PAGE, vec![live_draft()]);

    let config = RunConfig::default();
    let mut state = FetchState::new();
    let mut store = EventStore::new();

    run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;

    // Listing goes down; the known detail page is still checked.
    let broken = MockDiscovery::new().with_failure(LISTING);
    fetcher.set_page(LIVE_PAGE, "<html>9th LIVE, venue announced</html>");
    let second = run_once(&fetcher, &broken, &extractor, &config, &mut state, &mut store).await;

    assert_eq!(second.pages_checked, 1);
    assert_eq!(second.reconcile.updated, 1);
}

#[tokio::test]
async fn unresolved_phase_is_kept_and_reported() {
    let mut orphan = lottery_draft();
    orphan.parent_title = Some("Completely Different Concert".into());

    let fetcher = MockFetcher::new().with_page(TICKET_PAGE, "<html>抽選</html>");
    let discovery = MockDiscovery::new().with_listing(LISTING, vec![TICKET_PAGE.into()]);
    let extractor = MockExtractor::new().with_drafts(TICKET_PAGE, vec![orphan]);

    let config = RunConfig::default();
    let mut state = FetchState::new();
    let mut store = EventStore::new();

    let summary = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;
    assert_eq!(summary.unlinked_phases, 1);
    assert_eq!(summary.reconcile.added, 1);

    // Id derived from its own title (phase vocabulary stripped) and date.
    let child = store.get("mygo-9th-live-2031-03-06-lottery-cd-fastest").unwrap();
    assert!(child.parent_id.is_none());
}

#[tokio::test]
async fn invalid_records_dropped_without_losing_the_page() {
    let no_date = EventDraft {
        event_type: "live".into(),
        title: "Undated announcement".into(),
        ..Default::default()
    };

    let fetcher = MockFetcher::new().with_page(LIVE_PAGE, "<html>news</html>");
    let discovery = MockDiscovery::new().with_listing(LISTING, vec![LIVE_PAGE.into()]);
    let extractor = MockExtractor::new().with_drafts(LIVE_PAGE, vec![live_draft(), no_date]);

    let config = RunConfig::default();
    let mut state = FetchState::new();
    let mut store = EventStore::new();

    let summary = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;
    assert_eq!(summary.records_dropped, 1);
    assert_eq!(summary.reconcile.added, 1);

    // The page still committed: next run skips it.
    let second = run_once(&fetcher, &discovery, &extractor, &config, &mut state, &mut store).await;
    assert_eq!(second.pages_skipped, 1);
}
