// src/report/sectors.rs
//! Section 12, the sector-wise all-shares index report. Spans several pages
//! and runs straight into section 13 on its last one.

use tracing::debug;

use super::document::{page_index, present_cells, ReportDocument};
use super::Section;
use crate::error::Result;
use crate::table::{
    clean::{fold_newlines, strip_commas},
    RawGrid, RawTable,
};

pub const SECTOR_NAME: &str = "Sector Name";

fn tidy_page(rows: RawGrid) -> Result<Option<RawTable>> {
    let table = RawTable::from_grid(rows).drop_incomplete_rows();
    if table.is_empty() {
        return Ok(None);
    }
    let table = table
        .promote_header()?
        .drop_column_at(0)
        .map_cells(|c| strip_commas(c).trim().to_string())
        .normalize_headers()
        .map_column(SECTOR_NAME, fold_newlines)?;
    Ok(Some(table))
}

pub fn extract_sectors<D: ReportDocument + ?Sized>(doc: &D, pages: &[usize]) -> Result<RawTable> {
    let Some(&start) = pages.first() else {
        return Ok(RawTable::default());
    };
    let end = pages.get(1).copied().unwrap_or(start);
    let (from, to) = (page_index(doc, start)?, page_index(doc, end)?);
    let stop_marker = Section::SixMonthSummary.header();

    let mut out = RawTable::default();
    let mut stopped = false;
    for page in from..=to {
        let mut rows: RawGrid = Vec::new();
        'tables: for table in doc.extract_tables(page)? {
            for row in table {
                let cells = present_cells(row);
                if cells.iter().any(|c| c.contains(stop_marker)) {
                    stopped = true;
                    break 'tables;
                }
                rows.push(cells.into_iter().map(Some).collect());
            }
        }
        match tidy_page(rows)? {
            Some(table) => {
                debug!(page, rows = table.len(), "sector rows collected");
                out = out.append(table);
            }
            None => debug!(page, "no sector rows on page"),
        }
        if stopped {
            break;
        }
    }
    Ok(out)
}
