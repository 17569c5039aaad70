//! Pure text/number cleanup and pattern extraction.
//!
//! Everything here is total: bad input degrades to `None`, never an error.
//! The patterns mirror what the target site actually renders — Romanian
//! room counts ("3 camere"), metric areas ("75.5m²"), sector mentions
//! ("Sector 3" / "Sectorul 3") and `/oferta/...-<id>.html` listing links.

use std::sync::LazyLock;

use regex::Regex;

static SECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sector(?:ul)?\s*(\d)").expect("valid regex"));
static ROOMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*camer[ea]").expect("valid regex"));
static AREA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*m²").expect("valid regex"));
static ID_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d+)\.html").expect("valid regex"));
static ID_QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]id=(\d+)").expect("valid regex"));

/// Trim and collapse internal whitespace runs to single spaces.
/// Empty or whitespace-only input becomes `None`. Idempotent.
pub fn clean_text(s: Option<&str>) -> Option<String> {
    let s = s?;
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Pull the sector digit out of a location string ("București, Sector 3" → "3").
/// The digit range is NOT validated — sectors run 1–6 in reality, but an
/// implausible digit passes through unchanged (known limitation, kept as-is).
pub fn extract_sector(location: &str) -> Option<String> {
    SECTOR_RE
        .captures(location)
        .map(|c| c[1].to_string())
}

/// Scan free text for a room count and an area, independently.
/// First match anywhere wins; no plausibility check on the numbers.
pub fn parse_rooms_and_area(text: &str) -> (Option<u32>, Option<f64>) {
    let rooms = ROOMS_RE
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok());

    let area = AREA_RE
        .captures(text)
        .and_then(|c| c[1].replace(',', ".").parse::<f64>().ok());

    (rooms, area)
}

/// Derive a stable listing id from a link. Tries, in order: the numeric id
/// before a `.html` suffix, a numeric `id` query parameter, and finally the
/// last path segment capped at 80 chars. `None` only for an absent link.
pub fn derive_listing_id(link: Option<&str>) -> Option<String> {
    let link = link?;

    if let Some(c) = ID_SUFFIX_RE.captures(link) {
        return Some(c[1].to_string());
    }
    if let Some(c) = ID_QUERY_RE.captures(link) {
        return Some(c[1].to_string());
    }

    let trimmed = link.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    Some(last.chars().take(80).collect())
}

/// Whether an href points at a listing detail page.
pub fn looks_like_listing_link(href: &str) -> bool {
    href.contains("/oferta")
}

/// Absolutize an href against the site base URL. Root-relative paths are
/// joined, absolute http(s) URLs pass through, anything else is dropped.
pub fn normalize_link(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if href.starts_with('/') {
        let base = url::Url::parse(base_url).ok()?;
        return base.join(href).ok().map(|u| u.to_string());
    }
    None
}
