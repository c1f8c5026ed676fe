//! `stagewatch` - monitor artist event pages and keep a reconciled
//! event file up to date.
//!
//! One invocation is one pipeline run: fetch configured pages, extract
//! events from the ones that changed, and merge them into the store.
//! Run it from cron or a systemd timer for periodic monitoring.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tracker::{
    persist, pipeline, EventStore, ExactTitleResolver, HtmlLinkDiscovery, HttpFetcher,
    OpenAiExtractor, RunConfig,
};

#[derive(Parser)]
#[command(name = "stagewatch", version, about = "Monitor artist event pages for changes")]
struct Cli {
    /// TOML file listing artists and their monitored sources
    #[arg(long, default_value = "sources.toml")]
    config: PathBuf,

    /// Fetch state file (per-page fingerprints)
    #[arg(long, default_value = "state.json")]
    state: PathBuf,

    /// Reconciled event store file
    #[arg(long, default_value = "events.json")]
    output: PathBuf,

    /// Reprocess every page even if its content is unchanged
    #[arg(long)]
    force: bool,

    /// Concurrent page fetches per source
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Override the extraction model
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tracker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let artists = config::load_sources(&cli.config)?;
    let mut state = persist::load_state(&cli.state).context("loading fetch state")?;
    let mut store = persist::load_events(&cli.output).context("loading event store")?;

    tracing::info!(
        artists = artists.len(),
        known_pages = state.pages.len(),
        stored_events = store.len(),
        "Starting run"
    );

    let fetcher = HttpFetcher::new();
    let discovery = HtmlLinkDiscovery::new(HttpFetcher::new());
    let mut extractor = OpenAiExtractor::from_env().context("configuring extractor")?;
    if let Some(model) = &cli.model {
        extractor = extractor.with_model(model);
    }

    let mut run_config = RunConfig::new().with_concurrency(cli.concurrency);
    if cli.force {
        run_config = run_config.force();
    }

    let summary = pipeline::run(
        &artists,
        &run_config,
        &mut state,
        &mut store,
        &fetcher,
        &discovery,
        &extractor,
        &ExactTitleResolver,
    )
    .await?;

    persist::save_state(&cli.state, &state).context("saving fetch state")?;
    persist::save_events(&cli.output, &store).context("saving event store")?;

    print_report(&summary, &store);
    Ok(())
}

/// Human-readable run report on stdout; logs carry the details.
fn print_report(summary: &pipeline::RunSummary, store: &EventStore) {
    println!(
        "Checked {} pages ({} unchanged, {} failed); {} new events, {} updated, {} ended.",
        summary.pages_checked,
        summary.pages_skipped,
        summary.pages_failed,
        summary.reconcile.added,
        summary.reconcile.updated,
        summary.reconcile.newly_ended,
    );
    if summary.unlinked_phases > 0 {
        println!(
            "Warning: {} ticket phase(s) could not be linked to a parent event.",
            summary.unlinked_phases
        );
    }

    let upcoming: Vec<_> = store.events().iter().filter(|e| !e.ended).collect();
    if upcoming.is_empty() {
        println!("No upcoming events.");
        return;
    }

    println!("\nUpcoming events:");
    for event in upcoming {
        println!(
            "  {}  [{}] {}",
            event.date.format("%Y-%m-%d"),
            event.kind.as_str(),
            event.title
        );
        if event.action_required {
            match event.action_deadline {
                Some(deadline) => println!(
                    "      ACTION by {}: {}",
                    deadline.format("%Y-%m-%d %H:%M"),
                    event.action_description.as_deref().unwrap_or("see page")
                ),
                None => println!(
                    "      ACTION: {}",
                    event.action_description.as_deref().unwrap_or("see page")
                ),
            }
        }
    }
}
