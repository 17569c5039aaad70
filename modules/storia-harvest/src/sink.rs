//! Append-only CSV sink and diagnostic markup capture.
//!
//! The header is written once, when the destination does not yet exist;
//! later runs append without touching it. Cross-run duplicates among id-less
//! rows are possible and accepted.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::record::ListingRecord;

/// Fixed output column order.
pub const COLUMNS: [&str; 10] = [
    "listing_id",
    "Property_Title",
    "Price_Raw",
    "Location_Info",
    "Sector",
    "Room_Number",
    "Area_m2",
    "Link",
    "Scraped_At",
    "Page",
];

pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Open the sink, creating the file with its header if it does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
            }
            let file = fs::File::create(path)
                .with_context(|| format!("creating output file {}", path.display()))?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer.write_record(COLUMNS).context("writing CSV header")?;
            writer.flush().context("flushing CSV header")?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Append rows, returning how many were written. Rows are flushed before
    /// returning so partial progress survives a crash.
    pub fn append(&mut self, rows: &[ListingRecord]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening output file {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for row in rows {
            writer.serialize(row).context("serializing listing row")?;
        }
        writer.flush().context("flushing listing rows")?;
        Ok(rows.len() as u64)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Why a page's markup is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugKind {
    ZeroCards,
    LowYield,
}

/// Write a page's raw markup to the diagnostic directory, keyed by page
/// number, for offline selector-chain tuning.
pub fn capture_debug(dir: &Path, page: u32, kind: DebugKind, html: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating debug dir {}", dir.display()))?;
    let name = match kind {
        DebugKind::ZeroCards => format!("page_{page}.html"),
        DebugKind::LowYield => format!("page_{page}_lowrows.html"),
    };
    let path = dir.join(name);
    fs::write(&path, html).with_context(|| format!("writing debug capture {}", path.display()))?;
    debug!(path = %path.display(), "Captured debug markup");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CardCandidate;

    fn row(id: &str, page: u32) -> ListingRecord {
        CardCandidate {
            listing_id: Some(id.to_string()),
            title: Some(format!("Apartament {id}")),
            price_raw: Some("100 000 €".into()),
            link: Some(format!("https://x/oferta/ap-{id}.html")),
            ..Default::default()
        }
        .finalize(page)
        .unwrap()
    }

    #[test]
    fn header_written_once_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        assert_eq!(sink.append(&[row("1", 1), row("2", 1)]).unwrap(), 2);

        // Second run against the same file: no second header.
        let mut sink = CsvSink::open(&path).unwrap();
        assert_eq!(sink.append(&[row("3", 1)]).unwrap(), 1);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("listing_id,Property_Title"));
        assert_eq!(contents.matches("listing_id").count(), 1);
    }

    #[test]
    fn absent_fields_serialize_as_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let record = CardCandidate {
            price_raw: Some("55 000 €".into()),
            link: Some("https://x/oferta/ap-9.html".into()),
            listing_id: Some("9".into()),
            ..Default::default()
        }
        .finalize(2)
        .unwrap();

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&[record]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let data_line = contents.lines().nth(1).unwrap();
        // listing_id, empty title, price, then empty location/sector/rooms/area
        assert!(data_line.starts_with("9,,55 000 €,,,,,"));
        assert!(data_line.ends_with(",2"));
    }

    #[test]
    fn debug_capture_names_by_page_and_kind() {
        let dir = tempfile::tempdir().unwrap();
        let zero = capture_debug(dir.path(), 7, DebugKind::ZeroCards, "<html/>").unwrap();
        let low = capture_debug(dir.path(), 7, DebugKind::LowYield, "<html/>").unwrap();
        assert_eq!(zero.file_name().unwrap(), "page_7.html");
        assert_eq!(low.file_name().unwrap(), "page_7_lowrows.html");
        assert!(zero.exists() && low.exists());
    }
}
