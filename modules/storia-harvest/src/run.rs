//! Run controller: page iteration, per-page retry with backoff, run-wide
//! dedup, incremental persistence, request pacing.
//!
//! Pages are strictly sequential — one logical worker per run keeps the site
//! pacing honest and makes the enrichment cache's one-fetch-per-id guarantee
//! hold without locking. A page that exhausts its retries is logged and
//! skipped; nothing short of an unwritable destination aborts the run.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tracing::{info, warn};

use crate::config::Config;
use crate::enrich::EnrichmentCache;
use crate::page::scrape_page;
use crate::page_source::RenderedPage;
use crate::record::ListingRecord;
use crate::sink::CsvSink;

pub const MAX_ATTEMPTS: u32 = 3;

/// Mutable state for one run. Scoped here on purpose — no process-wide
/// singletons; everything dies with the run.
pub struct RunState {
    pub seen_ids: HashSet<String>,
    pub cache: EnrichmentCache,
    pub total_rows: u64,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            seen_ids: HashSet::new(),
            cache: EnrichmentCache::new(),
            total_rows: 0,
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-page fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    Pending,
    Fetching(u32),
    Retry(u32),
    Exhausted,
}

#[derive(Debug)]
enum PageOutcome {
    Success(Vec<ListingRecord>),
    Exhausted,
}

/// Backoff before re-attempting a failed page: `2 × attempt` seconds plus
/// up to a second of jitter. Pure in its inputs, for testability.
pub fn backoff_delay(attempt: u32, jitter_ms: u64) -> Duration {
    Duration::from_millis(u64::from(attempt) * 2000 + jitter_ms)
}

async fn fetch_page_with_retry(
    results: &mut dyn RenderedPage,
    detail: &mut dyn RenderedPage,
    page_num: u32,
    cache: &mut EnrichmentCache,
    cfg: &Config,
) -> PageOutcome {
    let mut state = FetchState::Pending;
    loop {
        state = match state {
            FetchState::Pending => FetchState::Fetching(1),
            FetchState::Fetching(attempt) => {
                match scrape_page(results, detail, page_num, cache, cfg).await {
                    Ok(rows) => return PageOutcome::Success(rows),
                    Err(err) => {
                        warn!(page = page_num, attempt, error = %err, "Page attempt failed");
                        if attempt < MAX_ATTEMPTS {
                            FetchState::Retry(attempt)
                        } else {
                            FetchState::Exhausted
                        }
                    }
                }
            }
            FetchState::Retry(attempt) => {
                let jitter_ms = rand::rng().random_range(0..1000);
                let delay = backoff_delay(attempt, jitter_ms);
                info!(
                    page = page_num,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Backing off before retry"
                );
                tokio::time::sleep(delay).await;
                FetchState::Fetching(attempt + 1)
            }
            FetchState::Exhausted => return PageOutcome::Exhausted,
        };
    }
}

/// Drop rows whose listing id was already seen this run. Rows without an id
/// are always kept — identity cannot be verified, so they never count as
/// duplicates.
pub fn dedup_rows(rows: Vec<ListingRecord>, seen: &mut HashSet<String>) -> Vec<ListingRecord> {
    rows.into_iter()
        .filter(|row| match &row.listing_id {
            Some(id) => seen.insert(id.clone()),
            None => true,
        })
        .collect()
}

/// End-of-run report.
#[derive(Debug)]
pub struct RunSummary {
    pub total_rows: u64,
    pub output_path: PathBuf,
    pub debug_dir: PathBuf,
    pub cache_size: usize,
}

/// Run the full page budget. Appends survivors to the output after every
/// page, so partial progress survives a crash. Callers wanting to stop early
/// do so by bounding `cfg.max_pages`; there is no mid-page cancellation.
pub async fn run(
    cfg: &Config,
    results: &mut dyn RenderedPage,
    detail: &mut dyn RenderedPage,
) -> Result<RunSummary> {
    let mut sink = CsvSink::open(&cfg.output_path)?;
    let mut state = RunState::new();

    for page_num in 1..=cfg.max_pages {
        let rows = match fetch_page_with_retry(results, detail, page_num, &mut state.cache, cfg)
            .await
        {
            PageOutcome::Success(rows) => rows,
            PageOutcome::Exhausted => {
                warn!(
                    page = page_num,
                    attempts = MAX_ATTEMPTS,
                    "Page exhausted its retries, continuing with next page"
                );
                Vec::new()
            }
        };

        let unique = dedup_rows(rows, &mut state.seen_ids);
        let added = sink.append(&unique)?;
        state.total_rows += added;
        info!(
            page = page_num,
            added,
            total = state.total_rows,
            "Page saved"
        );

        if page_num < cfg.max_pages {
            tokio::time::sleep(cfg.page_pacing()).await;
        }
    }

    Ok(RunSummary {
        total_rows: state.total_rows,
        output_path: cfg.output_path.clone(),
        debug_dir: cfg.debug_dir.clone(),
        cache_size: state.cache.len(),
    })
}
