// src/report/document.rs
use crate::error::{ExtractError, Result};
use crate::table::{Cell, RawGrid};

/// The handful of primitives the section code needs from a paginated
/// document. Page indices are 0-based.
pub trait ReportDocument {
    fn page_count(&self) -> usize;

    fn page_text(&self, index: usize) -> Result<String>;

    /// The page's main table, if it has one.
    fn extract_table(&self, index: usize) -> Result<Option<RawGrid>>;

    /// Every table on the page, top to bottom.
    fn extract_tables(&self, index: usize) -> Result<Vec<RawGrid>>;

    /// Raw `CreationDate` entry of the document info, e.g. `D:20240123...`.
    fn creation_date(&self) -> Option<String>;
}

/// Map a 1-based page number from a [`super::SectionIndex`] to a page index
/// of `doc`.
pub fn page_index<D: ReportDocument + ?Sized>(doc: &D, page_number: usize) -> Result<usize> {
    if page_number == 0 || page_number > doc.page_count() {
        return Err(ExtractError::MissingResource(format!(
            "page {page_number} is outside a {}-page document",
            doc.page_count()
        )));
    }
    Ok(page_number - 1)
}

/// Drop absent cells from a row, keeping the text of the rest.
pub fn present_cells(row: Vec<Cell>) -> Vec<String> {
    row.into_iter().flatten().collect()
}
