//! Detail-page enrichment: recover fields a card could not provide.
//!
//! Strictly best-effort. A navigation timeout, a render failure, or a missed
//! chain all degrade to a partial (possibly empty) result — enrichment never
//! aborts the enclosing page scrape, so callers treat "failed" and "empty"
//! identically.

use std::collections::HashMap;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::normalize::{clean_text, extract_sector, parse_rooms_and_area};
use crate::page::dismiss_consent;
use crate::page_source::{ElementHandle, RenderedPage};
use crate::selectors::{resolve, DETAIL_LOCATION_CHAIN, DETAIL_ROOMS_CHAIN, MIN_LOCATION_LEN};

/// Whole-page fallback: a city mention within 120 chars of a sector mention.
static CITY_SECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(bucurești[^.\n]{0,120}sector(?:ul)?\s*\d)").expect("valid regex")
});

/// Partial field set recovered from a detail page. Empty means the fetch
/// failed or the page simply did not expose the fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub location_info: Option<String>,
    pub sector: Option<String>,
    pub room_number: Option<u32>,
}

/// Fetch `link` on the detail session and fill only the requested fields.
/// Returns whatever was computed before any failure.
pub async fn enrich_from_detail(
    page: &mut dyn RenderedPage,
    link: &str,
    need_location: bool,
    need_rooms: bool,
    timeout: Duration,
) -> Enrichment {
    let mut out = Enrichment::default();

    if let Err(err) = page.navigate(link, timeout).await {
        warn!(link, error = %err, "Detail fetch failed, keeping partial result");
        return out;
    }
    page.wait(900).await;
    dismiss_consent(&*page).await;

    let root = page.root();

    if need_location {
        let location = resolve(&root, DETAIL_LOCATION_CHAIN, MIN_LOCATION_LEN)
            .or_else(|| location_from_page_text(root.text()));
        out.sector = location.as_deref().and_then(extract_sector);
        out.location_info = location;
    }

    if need_rooms {
        out.room_number = rooms_from_detail(&root);
    }

    debug!(
        link,
        location = out.location_info.is_some(),
        rooms = out.room_number.is_some(),
        "Detail enrichment done"
    );
    out
}

fn location_from_page_text(page_text: &str) -> Option<String> {
    CITY_SECTOR_RE
        .captures(page_text)
        .and_then(|c| clean_text(Some(&c[1])))
}

/// Room count from the detail chains: each locator's match is parsed for the
/// room pattern independently, so a match without a number does not stop the
/// chain. Whole-page text scan as the last resort.
fn rooms_from_detail(root: &ElementHandle) -> Option<u32> {
    for locator in DETAIL_ROOMS_CHAIN {
        if let Some(el) = root.query(locator) {
            let (rooms, _) = parse_rooms_and_area(el.text());
            if rooms.is_some() {
                return rooms;
            }
        }
    }
    parse_rooms_and_area(root.text()).0
}

/// Per-run memo of detail fetches, keyed by listing id. Guarantees at most
/// one detail fetch per distinct id regardless of how many cards reference it
/// (listings legitimately reappear across result pages on re-sort).
/// Not persisted across runs.
#[derive(Debug, Default)]
pub struct EnrichmentCache {
    entries: HashMap<String, Enrichment>,
}

impl EnrichmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for `id`, or compute, store, and return it.
    pub async fn get_or_compute<F, Fut>(&mut self, id: &str, compute: F) -> Enrichment
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Enrichment>,
    {
        if let Some(hit) = self.entries.get(id) {
            debug!(listing_id = id, "Enrichment cache hit");
            return hit.clone();
        }
        let fresh = compute().await;
        self.entries.insert(id.to_string(), fresh.clone());
        fresh
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
