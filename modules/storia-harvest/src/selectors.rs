//! Selector fallback engine.
//!
//! The results markup has no stable schema: a field's value may sit behind a
//! `data-cy` attribute, a `data-testid`, or a bare tag, and any of them can be
//! missing. Each logical field gets an ordered chain of locators tried until
//! one yields text long enough to trust. Chain order encodes priority:
//! structured data attributes before generic tags before anchor attributes.
//! Falling all the way through is an expected outcome, not an error.

use crate::normalize::clean_text;
use crate::page_source::ElementHandle;

/// One candidate locator for a field.
///
/// `CssContains` is the typed stand-in for text-anchored lookups ("a `<p>`
/// mentioning Sector") that plain CSS cannot express.
#[derive(Debug, Clone, Copy)]
pub enum Locator {
    Css(&'static str),
    CssContains {
        css: &'static str,
        needle: &'static str,
    },
}

/// Minimum accepted lengths per field. Anything shorter is treated as noise
/// (an icon glyph, a stray currency symbol) and the chain keeps going.
pub const MIN_TITLE_LEN: usize = 3;
pub const MIN_LOCATION_LEN: usize = 2;
pub const MIN_PRICE_LEN: usize = 1;

pub const TITLE_CHAIN: &[Locator] = &[
    Locator::Css("[data-cy*='title']"),
    Locator::Css("[data-testid*='title']"),
    Locator::Css("h2"),
    Locator::Css("h3"),
    Locator::Css("a[title]"),
    Locator::Css("a[aria-label]"),
];

pub const LOCATION_CHAIN: &[Locator] = &[
    Locator::Css("[data-cy*='location']"),
    Locator::Css("[data-testid*='location']"),
    Locator::Css("[data-cy*='address']"),
    Locator::Css("[data-testid*='address']"),
    Locator::CssContains {
        css: "p",
        needle: "Sector",
    },
];

pub const PRICE_CHAIN: &[Locator] = &[
    Locator::Css("[data-cy*='price']"),
    Locator::Css("[data-testid*='price']"),
    Locator::CssContains {
        css: "p",
        needle: "€",
    },
    Locator::CssContains {
        css: "span",
        needle: "€",
    },
];

// Detail pages expose the same information under different markup, so they
// get their own chains.

pub const DETAIL_LOCATION_CHAIN: &[Locator] = &[
    Locator::Css("[data-cy*='address']"),
    Locator::Css("[data-testid*='address']"),
    Locator::Css("[data-cy*='location']"),
    Locator::Css("[data-testid*='location']"),
    Locator::CssContains {
        css: "header *",
        needle: "Sector",
    },
];

pub const DETAIL_ROOMS_CHAIN: &[Locator] = &[
    Locator::Css("[data-cy*='rooms']"),
    Locator::Css("[data-testid*='rooms']"),
    Locator::CssContains {
        css: "li",
        needle: "camere",
    },
    Locator::CssContains {
        css: "span",
        needle: "camere",
    },
];

/// Walk the chain in order; first locator whose first match yields cleaned
/// text of at least `min_len` wins.
pub fn resolve(root: &ElementHandle, chain: &[Locator], min_len: usize) -> Option<String> {
    for locator in chain {
        if let Some(el) = root.query(locator) {
            if let Some(text) = clean_text(Some(el.text())) {
                if text.chars().count() >= min_len {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// First attribute from `attrs` (in priority order) that yields cleaned text
/// of at least `min_len`. Used for link-like fields where the anchor's
/// `title`/`aria-label` stand in for missing inner text.
pub fn resolve_attr(el: &ElementHandle, attrs: &[&str], min_len: usize) -> Option<String> {
    for name in attrs {
        if let Some(text) = clean_text(el.attr(name)) {
            if text.chars().count() >= min_len {
                return Some(text);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_source::document_handle;

    #[test]
    fn second_locator_wins_when_first_misses() {
        let html = r#"
            <article>
              <span data-testid="ad-title">Apartament 3 camere Dristor</span>
            </article>
        "#;
        let root = document_handle(html);
        let chain = &[
            Locator::Css("[data-cy*='title']"),
            Locator::Css("[data-testid*='title']"),
            Locator::Css("h2"),
        ];
        assert_eq!(
            resolve(&root, chain, MIN_TITLE_LEN),
            Some("Apartament 3 camere Dristor".to_string())
        );
    }

    #[test]
    fn below_threshold_matches_are_rejected() {
        let html = r#"<article><h2>ok</h2><h3>x</h3></article>"#;
        let root = document_handle(html);
        let chain = &[Locator::Css("h2"), Locator::Css("h3")];
        // Both match, both are under the 3-char title threshold.
        assert_eq!(resolve(&root, chain, MIN_TITLE_LEN), None);
    }

    #[test]
    fn chain_order_encodes_priority() {
        let html = r#"
            <article>
              <h2>Generic heading text</h2>
              <p data-cy="listing-title">Structured title text</p>
            </article>
        "#;
        let root = document_handle(html);
        assert_eq!(
            resolve(&root, TITLE_CHAIN, MIN_TITLE_LEN),
            Some("Structured title text".to_string())
        );
    }

    #[test]
    fn empty_chain_result_is_absent_not_error() {
        let root = document_handle("<div></div>");
        assert_eq!(resolve(&root, TITLE_CHAIN, MIN_TITLE_LEN), None);
    }

    #[test]
    fn attr_fallback_prefers_title_over_aria_label() {
        let html = r#"<a href="/x" title="Titlul real" aria-label="alt text">"#;
        let root = document_handle(html);
        let anchor = root.query(&Locator::Css("a[href]")).unwrap();
        assert_eq!(
            resolve_attr(&anchor, &["title", "aria-label"], MIN_TITLE_LEN),
            Some("Titlul real".to_string())
        );
    }
}
