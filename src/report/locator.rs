// src/report/locator.rs
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{document::ReportDocument, Section};
use crate::error::Result;

/// Section → 1-based page numbers that hold its table, strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionIndex {
    pages: BTreeMap<Section, Vec<usize>>,
}

impl SectionIndex {
    /// Empty when the section's header never matched.
    pub fn pages(&self, section: Section) -> &[usize] {
        self.pages.get(&section).map(Vec::as_slice).unwrap_or_default()
    }

    /// Located sections in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &[usize])> {
        self.pages.iter().map(|(s, p)| (*s, p.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn record(&mut self, section: Section, page: usize) {
        let pages = self.pages.entry(section).or_default();
        if pages.last().map_or(true, |&last| page > last) {
            pages.push(page);
        }
    }
}

/// Scan every page after the cover for the headers of `sections`.
///
/// A header printed on the page at index `i` announces a table starting on
/// the following page, recorded as page number `i + 2`.
pub fn locate_sections<D: ReportDocument + ?Sized>(
    doc: &D,
    sections: &[Section],
) -> Result<SectionIndex> {
    let mut index = SectionIndex::default();
    for page in 1..doc.page_count() {
        let text = match doc.page_text(page) {
            Ok(text) => text,
            Err(e) => {
                warn!(page, error = %e, "could not read page text; skipping page");
                continue;
            }
        };
        for &section in sections {
            if text.contains(section.header()) {
                debug!(page, section = section.slug(), "matched section header");
                index.record(section, page + 2);
            }
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fake::{FakePage, FakeReport};

    #[test]
    fn header_on_third_page_maps_to_four() -> anyhow::Result<()> {
        let doc = FakeReport::new(vec![
            FakePage::text("cover"),
            FakePage::text("contents"),
            FakePage::text("... SECTION 5: BOARD MEETINGS ..."),
            FakePage::text("meetings table"),
            FakePage::text("end"),
        ]);
        let index = locate_sections(&doc, &Section::ALL)?;
        assert_eq!(index.pages(Section::BoardMeetings), &[4]);
        assert!(index.pages(Section::MacroView).is_empty());
        Ok(())
    }

    #[test]
    fn cover_page_is_never_scanned() -> anyhow::Result<()> {
        let doc = FakeReport::new(vec![
            FakePage::text(Section::MacroView.header()),
            FakePage::text("nothing"),
        ]);
        assert!(locate_sections(&doc, &Section::ALL)?.is_empty());
        Ok(())
    }

    #[test]
    fn multi_page_sections_keep_page_order() -> anyhow::Result<()> {
        let sector = Section::SectorIndex.header();
        let doc = FakeReport::new(vec![
            FakePage::text("cover"),
            FakePage::text(sector),
            FakePage::text(&format!("{sector} (continued)")),
            FakePage::text("section 12: all shares index report (sector wise)"),
        ]);
        let index = locate_sections(&doc, &Section::ALL)?;
        assert_eq!(index.pages(Section::SectorIndex), &[3, 4]);
        let found: Vec<_> = index.iter().map(|(s, _)| s).collect();
        assert_eq!(found, vec![Section::SectorIndex]);
        Ok(())
    }
}
