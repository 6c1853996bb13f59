// src/report/events.rs
//! Section 5, board meetings. One page or a two-page range.

use tracing::debug;

use super::document::{page_index, ReportDocument};
use crate::error::{ExtractError, Result};
use crate::table::{date_parser::parse_datetime, RawTable};

pub const DATETIME_COLUMN: &str = "Datetime";

/// Complete rows of one page's table, first row as header, index column
/// dropped. `None` when the page has no table.
fn page_table<D: ReportDocument + ?Sized>(doc: &D, page: usize) -> Result<Option<RawTable>> {
    let Some(grid) = doc.extract_table(page)? else {
        return Ok(None);
    };
    let table = RawTable::from_grid(grid).drop_incomplete_rows();
    if table.is_empty() {
        return Ok(None);
    }
    Ok(Some(table.promote_header()?.drop_column_at(0)))
}

/// Replace `Date` and `Time` with one ISO `Datetime` column.
fn fuse_datetime(table: RawTable) -> Result<RawTable> {
    let fused = table
        .column("Date")?
        .zip(table.column("Time")?)
        .map(|(d, t)| {
            let joined = format!("{} {}", d.unwrap_or_default(), t.unwrap_or_default());
            parse_datetime(&joined)
                .map(|dt| Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
                .ok_or_else(|| ExtractError::date(joined, "<date> <time>"))
        })
        .collect::<Result<Vec<_>>>()?;
    table
        .push_column(DATETIME_COLUMN, fused)?
        .drop_columns(&["Date", "Time"])
}

/// A single page gets its `Date`/`Time` pair fused into `Datetime`; a range
/// is concatenated page by page with the pair left as printed.
// TODO: confirm with the report's consumers whether ranges should be fused too.
pub fn extract_events<D: ReportDocument + ?Sized>(doc: &D, pages: &[usize]) -> Result<RawTable> {
    match pages {
        [] => Err(ExtractError::EmptyInput("board meetings have no pages".into())),
        [single] => {
            let table = page_table(doc, page_index(doc, *single)?)?.ok_or_else(|| {
                ExtractError::EmptyInput(format!("no board meeting table on page {single}"))
            })?;
            fuse_datetime(table)
        }
        [start, end, ..] => {
            let (from, to) = (page_index(doc, *start)?, page_index(doc, *end)?);
            let mut out = RawTable::default();
            for page in from..=to {
                match page_table(doc, page)? {
                    Some(table) => out = out.append(table),
                    None => debug!(page, "no board meeting table on page"),
                }
            }
            Ok(out)
        }
    }
}
