//! Page orchestration: one results page → finalized listing records.
//!
//! Navigation failures bubble up for the run controller's retry loop.
//! Everything after a successful navigation degrades instead of failing:
//! zero cards and low yields are diagnostic conditions, not errors.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::enrich::{enrich_from_detail, EnrichmentCache};
use crate::extract::extract_card;
use crate::normalize::looks_like_listing_link;
use crate::page_source::{ElementHandle, RenderedPage};
use crate::record::ListingRecord;
use crate::selectors::Locator;
use crate::sink::{capture_debug, DebugKind};

/// Pages yielding fewer rows than this get a diagnostic markup capture.
pub const MIN_ROWS_PER_PAGE: usize = 5;

/// Upper bound on the post-render wait for any anchor to appear.
const ANCHOR_WAIT_MS: u64 = 12_000;
const ANCHOR_POLL_MS: u64 = 500;

/// Best-effort cookie-consent handling. The render service is asked to settle
/// the page before snapshotting; if the consent prompt still shows in the
/// markup, give it one more settle. Never fails the caller.
pub async fn dismiss_consent(page: &dyn RenderedPage) {
    let consent_btn = Locator::Css("button#onetrust-accept-btn-handler");
    if page.root().query(&consent_btn).is_some() {
        debug!("Consent prompt present in rendered markup");
        page.wait(400).await;
    }
}

/// Three-tier card enumeration: articles containing a listing-shaped anchor,
/// then listing-attributed containers with any anchor, then bare articles.
fn listing_cards(root: &ElementHandle) -> Vec<ElementHandle> {
    let articles = root.query_all("article");

    let with_listing_anchor: Vec<ElementHandle> = articles
        .iter()
        .filter(|card| {
            card.query_all("a[href]")
                .iter()
                .any(|a| a.attr("href").is_some_and(looks_like_listing_link))
        })
        .cloned()
        .collect();
    if !with_listing_anchor.is_empty() {
        return with_listing_anchor;
    }

    let tagged: Vec<ElementHandle> = ["[data-cy*='listing']", "[data-testid*='listing']"]
        .iter()
        .flat_map(|css| root.query_all(css))
        .filter(|card| card.query(&Locator::Css("a[href]")).is_some())
        .collect();
    if !tagged.is_empty() {
        return tagged;
    }

    articles
}

/// Scrape one results page: enumerate cards, extract, enrich missing fields
/// through the cache, finalize qualifying records.
pub async fn scrape_page(
    results: &mut dyn RenderedPage,
    detail: &mut dyn RenderedPage,
    page_num: u32,
    cache: &mut EnrichmentCache,
    cfg: &Config,
) -> Result<Vec<ListingRecord>> {
    let url = cfg.page_url(page_num);
    info!(page = page_num, url = url.as_str(), "Opening results page");

    results
        .navigate(&url, cfg.goto_timeout)
        .await
        .with_context(|| format!("results page {page_num} navigation failed"))?;
    results.wait(1500).await;

    dismiss_consent(&*results).await;

    // Lazy-load settle; the renderer has already been asked to wait past load.
    results.wait(900).await;

    let mut waited = 0;
    while results.root().query(&Locator::Css("a[href]")).is_none() && waited < ANCHOR_WAIT_MS {
        results.wait(ANCHOR_POLL_MS).await;
        waited += ANCHOR_POLL_MS;
    }

    let root = results.root();
    let cards = listing_cards(&root);

    if cards.is_empty() {
        warn!(page = page_num, "No listing cards found, capturing markup");
        if let Err(err) = capture_debug(&cfg.debug_dir, page_num, DebugKind::ZeroCards, results.content()) {
            warn!(page = page_num, error = %err, "Debug capture failed");
        }
        return Ok(Vec::new());
    }
    debug!(page = page_num, cards = cards.len(), "Enumerated listing cards");

    let mut rows = Vec::new();
    for card in &cards {
        let mut candidate = extract_card(card, &cfg.base_url);

        // Cards without a listing-shaped link are ads or navigation chrome.
        let Some(link) = candidate.link.clone() else {
            continue;
        };
        if !looks_like_listing_link(&link) {
            continue;
        }

        if cfg.enrich_enabled {
            let need_location = candidate.location_info.is_none() || candidate.sector.is_none();
            let need_rooms = candidate.room_number.is_none();

            let enrichable = (need_location || need_rooms)
                .then(|| candidate.listing_id.clone())
                .flatten();
            if let Some(id) = enrichable {
                let detail_session = &mut *detail;
                let detail_link = link.clone();
                let enrichment = cache
                    .get_or_compute(&id, move || async move {
                        let out = enrich_from_detail(
                            detail_session,
                            &detail_link,
                            need_location,
                            need_rooms,
                            cfg.detail_timeout,
                        )
                        .await;
                        // Pace detail fetches whether they succeeded or not.
                        tokio::time::sleep(cfg.detail_pacing()).await;
                        out
                    })
                    .await;

                // Backfill only what's missing; resolved values are never overwritten.
                if need_location {
                    candidate.location_info =
                        candidate.location_info.or(enrichment.location_info);
                    candidate.sector = candidate.sector.or(enrichment.sector);
                }
                if need_rooms {
                    candidate.room_number = candidate.room_number.or(enrichment.room_number);
                }
            }
        }

        if let Some(row) = candidate.finalize(page_num) {
            rows.push(row);
        }
    }

    if rows.len() < MIN_ROWS_PER_PAGE {
        warn!(
            page = page_num,
            rows = rows.len(),
            "Low-yield page, capturing markup"
        );
        if let Err(err) = capture_debug(&cfg.debug_dir, page_num, DebugKind::LowYield, results.content()) {
            warn!(page = page_num, error = %err, "Debug capture failed");
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_source::document_handle;

    fn root(html: &str) -> ElementHandle {
        document_handle(html)
    }

    #[test]
    fn articles_with_listing_anchor_win() {
        let r = root(r#"
            <article><a href="/ro/oferta/ap-1.html">A</a></article>
            <article><a href="/promo">B</a></article>
        "#);
        let cards = listing_cards(&r);
        assert_eq!(cards.len(), 1);
        assert!(cards[0].text().contains('A'));
    }

    #[test]
    fn falls_back_to_listing_attribute_containers() {
        let r = root(r#"
            <div data-cy="listing-item"><a href="/x">A</a></div>
            <div data-testid="search-listing"><a href="/y">B</a></div>
            <div data-cy="listing-banner">no anchor</div>
        "#);
        let cards = listing_cards(&r);
        assert_eq!(cards.len(), 2);
    }

    #[test]
    fn bare_articles_as_last_resort() {
        let r = root("<article>just text</article><article>more</article>");
        assert_eq!(listing_cards(&r).len(), 2);
    }

    #[test]
    fn no_cards_at_all() {
        let r = root("<div>empty shell page</div>");
        assert!(listing_cards(&r).is_empty());
    }
}
