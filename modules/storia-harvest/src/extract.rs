//! Card extraction: one rendered listing card → one candidate record.
//!
//! Pure reads of the provided card subtree. Every field degrades to absent
//! when its chain misses; the retention decision happens later.

use crate::normalize::{
    derive_listing_id, extract_sector, looks_like_listing_link, normalize_link,
    parse_rooms_and_area,
};
use crate::page_source::ElementHandle;
use crate::record::CardCandidate;
use crate::selectors::{
    resolve, resolve_attr, Locator, LOCATION_CHAIN, MIN_LOCATION_LEN, MIN_PRICE_LEN,
    MIN_TITLE_LEN, PRICE_CHAIN, TITLE_CHAIN,
};

/// Extract a candidate record from one listing card.
pub fn extract_card(card: &ElementHandle, base_url: &str) -> CardCandidate {
    let link = extract_listing_link(card, base_url);

    let title = resolve(card, TITLE_CHAIN, MIN_TITLE_LEN)
        .or_else(|| first_anchor_label(card));
    let price_raw = resolve(card, PRICE_CHAIN, MIN_PRICE_LEN);
    let location_info = resolve(card, LOCATION_CHAIN, MIN_LOCATION_LEN);

    let (room_number, area_m2) = parse_rooms_and_area(card.text());
    let sector = location_info.as_deref().and_then(extract_sector);
    let listing_id = derive_listing_id(link.as_deref());

    CardCandidate {
        listing_id,
        title,
        price_raw,
        location_info,
        sector,
        room_number,
        area_m2,
        link,
    }
}

/// First anchor whose href is listing-shaped, falling back to the first
/// anchor present. Hrefs are absolutized against the site base URL.
fn extract_listing_link(card: &ElementHandle, base_url: &str) -> Option<String> {
    let anchors = card.query_all("a[href]");
    for anchor in &anchors {
        if let Some(href) = anchor.attr("href") {
            if looks_like_listing_link(href) {
                return normalize_link(href, base_url);
            }
        }
    }
    anchors
        .first()
        .and_then(|a| a.attr("href"))
        .and_then(|href| normalize_link(href, base_url))
}

/// Title fallback: the first anchor's `title`/`aria-label` attribute.
fn first_anchor_label(card: &ElementHandle) -> Option<String> {
    let anchor = card.query(&Locator::Css("a[href]"))?;
    resolve_attr(&anchor, &["title", "aria-label"], MIN_TITLE_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_source::document_handle;

    const BASE: &str = "https://www.storia.ro";

    fn card(html: &str) -> ElementHandle {
        document_handle(html)
            .query_all("article")
            .into_iter()
            .next()
            .expect("test markup has an article")
    }

    #[test]
    fn full_card_extracts_every_field() {
        let c = card(r#"
            <article>
              <a href="/ro/oferta/apartament-3-camere-123456.html">
                <h3>Apartament 3 camere Dristor</h3>
              </a>
              <p data-cy="listing-item-price">145 000 €</p>
              <p data-testid="advert-card-address">București, Sector 3, Dristor</p>
              <span>3 camere · 75.5m²</span>
            </article>
        "#);
        let got = extract_card(&c, BASE);
        assert_eq!(got.title.as_deref(), Some("Apartament 3 camere Dristor"));
        assert_eq!(got.price_raw.as_deref(), Some("145 000 €"));
        assert_eq!(
            got.location_info.as_deref(),
            Some("București, Sector 3, Dristor")
        );
        assert_eq!(got.sector.as_deref(), Some("3"));
        assert_eq!(got.room_number, Some(3));
        assert_eq!(got.area_m2, Some(75.5));
        assert_eq!(
            got.link.as_deref(),
            Some("https://www.storia.ro/ro/oferta/apartament-3-camere-123456.html")
        );
        assert_eq!(got.listing_id.as_deref(), Some("123456"));
    }

    #[test]
    fn listing_link_preferred_over_first_anchor() {
        let c = card(r#"
            <article>
              <a href="/agentie/imobiliare-x">Agenția X</a>
              <a href="/ro/oferta/garsoniera-777.html">Garsonieră</a>
            </article>
        "#);
        let got = extract_card(&c, BASE);
        assert_eq!(
            got.link.as_deref(),
            Some("https://www.storia.ro/ro/oferta/garsoniera-777.html")
        );
        assert_eq!(got.listing_id.as_deref(), Some("777"));
    }

    #[test]
    fn falls_back_to_first_anchor_when_none_listing_shaped() {
        let c = card(r#"
            <article>
              <a href="/promo/banner">Promo</a>
              <h2>Ceva interesant</h2>
            </article>
        "#);
        let got = extract_card(&c, BASE);
        assert_eq!(got.link.as_deref(), Some("https://www.storia.ro/promo/banner"));
    }

    #[test]
    fn anchor_attributes_back_up_a_missing_title() {
        let c = card(r#"
            <article>
              <a href="/ro/oferta/ap-55.html" aria-label="Apartament cu 2 camere"></a>
            </article>
        "#);
        let got = extract_card(&c, BASE);
        assert_eq!(got.title.as_deref(), Some("Apartament cu 2 camere"));
    }

    #[test]
    fn bare_card_yields_mostly_absent_fields() {
        let c = card("<article><div>fara continut util</div></article>");
        let got = extract_card(&c, BASE);
        assert!(got.link.is_none());
        assert!(got.title.is_none());
        assert!(got.listing_id.is_none());
        assert!(!got.qualifies());
    }
}
