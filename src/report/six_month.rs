// src/report/six_month.rs
//! Section 13, main board data for the last six months. Shares its page
//! with the tail of section 12, so rows are taken between two markers.

use super::document::{page_index, present_cells, ReportDocument};
use super::Section;
use crate::error::{ExtractError, Result};
use crate::table::{
    clean::{collapse_whitespace, strip_commas},
    RawTable, Row,
};

pub const END_MARKER: &str = "SECTION 14: DEFAULTER SEGMENT";

pub const COLUMNS: [&str; 7] = [
    "Month at the Close",
    "Listed Capital(million)",
    "Market Capitalization(million)",
    "Turnover In Ready MRKT",
    "Turnover In Future MRKT",
    "KSE 100 Index",
    "KSE All Share",
];

fn empty() -> RawTable {
    RawTable::new(COLUMNS.iter().map(|s| s.to_string()).collect(), Vec::new())
}

pub fn extract_six_month<D: ReportDocument + ?Sized>(doc: &D, pages: &[usize]) -> Result<RawTable> {
    let Some(&first) = pages.first() else {
        return Ok(empty());
    };
    let Some(grid) = doc.extract_table(page_index(doc, first)?)? else {
        return Ok(empty());
    };
    let start_marker = Section::SixMonthSummary.header();

    let mut rows: Vec<Row> = Vec::new();
    let mut started = false;
    for row in grid {
        if !started {
            started = row
                .first()
                .and_then(Option::as_deref)
                .is_some_and(|c| c.contains(start_marker));
        }
        if !started {
            continue;
        }
        let cells: Vec<String> = present_cells(row)
            .iter()
            .map(|c| collapse_whitespace(c))
            .collect();
        let done = cells.iter().any(|c| c.contains(END_MARKER));
        if cells.len() > COLUMNS.len() {
            return Err(ExtractError::mismatch(format!(
                "six-month row has {} cells, expected {}",
                cells.len(),
                COLUMNS.len()
            )));
        }
        rows.push(cells.into_iter().map(Some).collect());
        if done {
            break;
        }
    }

    let table = RawTable::new(COLUMNS.iter().map(|s| s.to_string()).collect(), rows)
        .drop_incomplete_rows()
        .map_cells(strip_commas);
    Ok(table)
}
