//! Listing record types.

use serde::Serialize;

/// Raw per-card extraction result. Any subset of fields may be present;
/// whether the card survives is decided at finalization.
#[derive(Debug, Clone, Default)]
pub struct CardCandidate {
    pub listing_id: Option<String>,
    pub title: Option<String>,
    pub price_raw: Option<String>,
    pub location_info: Option<String>,
    pub sector: Option<String>,
    pub room_number: Option<u32>,
    pub area_m2: Option<f64>,
    pub link: Option<String>,
}

/// One finalized output row. Field names serialize to the exact CSV column
/// headers; never mutated after being appended to the output table.
#[derive(Debug, Clone, Serialize)]
pub struct ListingRecord {
    pub listing_id: Option<String>,
    #[serde(rename = "Property_Title")]
    pub title: Option<String>,
    #[serde(rename = "Price_Raw")]
    pub price_raw: Option<String>,
    #[serde(rename = "Location_Info")]
    pub location_info: Option<String>,
    #[serde(rename = "Sector")]
    pub sector: Option<String>,
    #[serde(rename = "Room_Number")]
    pub room_number: Option<u32>,
    #[serde(rename = "Area_m2")]
    pub area_m2: Option<f64>,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Scraped_At")]
    pub scraped_at: String,
    #[serde(rename = "Page")]
    pub page: u32,
}

impl CardCandidate {
    /// Retention invariant: a link plus at least one of title/price/location.
    pub fn qualifies(&self) -> bool {
        self.link.is_some()
            && (self.title.is_some() || self.price_raw.is_some() || self.location_info.is_some())
    }

    /// Finalize into an output row, or `None` if the retention invariant
    /// does not hold.
    pub fn finalize(self, page: u32) -> Option<ListingRecord> {
        if !self.qualifies() {
            return None;
        }
        let link = self.link?;
        Some(ListingRecord {
            listing_id: self.listing_id,
            title: self.title,
            price_raw: self.price_raw,
            location_info: self.location_info,
            sector: self.sector,
            room_number: self.room_number,
            area_m2: self.area_m2,
            link,
            scraped_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_alone_does_not_qualify() {
        let card = CardCandidate {
            link: Some("https://x/oferta/a-1.html".into()),
            ..Default::default()
        };
        assert!(!card.qualifies());
    }

    #[test]
    fn link_plus_price_qualifies() {
        let card = CardCandidate {
            link: Some("https://x/oferta/a-1.html".into()),
            price_raw: Some("89 000 €".into()),
            ..Default::default()
        };
        assert!(card.qualifies());
    }

    #[test]
    fn no_link_never_qualifies() {
        let card = CardCandidate {
            title: Some("Apartament".into()),
            price_raw: Some("89 000 €".into()),
            ..Default::default()
        };
        assert!(!card.qualifies());
        assert!(card.finalize(1).is_none());
    }

    #[test]
    fn finalize_stamps_page_and_timestamp() {
        let row = CardCandidate {
            link: Some("https://x/oferta/a-1.html".into()),
            title: Some("Apartament".into()),
            ..Default::default()
        }
        .finalize(7)
        .unwrap();
        assert_eq!(row.page, 7);
        assert!(row.scraped_at.contains('T'));
    }
}
