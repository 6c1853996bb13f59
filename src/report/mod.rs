// src/report/mod.rs
//! The daily quotation PDF: where each section lives and how its table is
//! rebuilt from page cell grids.
pub mod document;
pub mod events;
pub mod layout;
pub mod locator;
pub mod macro_view;
pub mod pdf;
pub mod sectors;
pub mod six_month;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;

pub use document::ReportDocument;
pub use locator::{locate_sections, SectionIndex};
pub use pdf::PdfReport;

use crate::error::Result;
use crate::table::RawTable;

/// The report sections the pipeline knows how to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    MacroView,
    BoardMeetings,
    SectorIndex,
    SixMonthSummary,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::MacroView,
        Section::BoardMeetings,
        Section::SectorIndex,
        Section::SixMonthSummary,
    ];

    /// Header text as printed in the report; matched verbatim.
    pub fn header(self) -> &'static str {
        match self {
            Section::MacroView => "SECTION 1: MACRO VIEW OF THE MARKET",
            Section::BoardMeetings => "SECTION 5: BOARD MEETINGS",
            Section::SectorIndex => "SECTION 12: ALL SHARES INDEX REPORT (SECTOR WISE)",
            Section::SixMonthSummary => "SECTION 13: MAIN BOARD DATA FOR THE LAST 6 MONTHS",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Section::MacroView => "macro_view",
            Section::BoardMeetings => "board_meetings",
            Section::SectorIndex => "sector_index",
            Section::SixMonthSummary => "six_month_summary",
        }
    }

    /// Rebuild this section's table from the pages the locator found.
    pub fn extract<D: ReportDocument + ?Sized>(
        self,
        doc: &D,
        pages: &[usize],
        exchange_id: &str,
    ) -> Result<RawTable> {
        match self {
            Section::MacroView => macro_view::extract_macro_view(doc, pages, exchange_id),
            Section::BoardMeetings => events::extract_events(doc, pages),
            Section::SectorIndex => sectors::extract_sectors(doc, pages),
            Section::SixMonthSummary => six_month::extract_six_month(doc, pages),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}
