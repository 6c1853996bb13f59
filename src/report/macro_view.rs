// src/report/macro_view.rs
//! Section 1, the market's macro view: one page, metrics down the left,
//! one column per board. Turned on its side so each board becomes a row.

use tracing::debug;

use super::document::{page_index, present_cells, ReportDocument};
use crate::error::{ExtractError, Result};
use crate::table::{clean::strip_commas, date_parser::parse_compact_ymd, RawTable, Row};

pub const SENTINEL: &str = "PUBLICLY ISSUED DEBT SECURITIES";
pub const COLUMNS: [&str; 4] = ["Market", "Main Board", "Details", "GEM Board"];
const DROPPED_ROW: &str = "Details";

pub fn extract_macro_view<D: ReportDocument + ?Sized>(
    doc: &D,
    pages: &[usize],
    exchange_id: &str,
) -> Result<RawTable> {
    let first = *pages
        .first()
        .ok_or_else(|| ExtractError::EmptyInput("macro view has no pages".into()))?;
    let raw_date = doc.creation_date().unwrap_or_default();
    let date = parse_compact_ymd(&raw_date)?;

    let idx = page_index(doc, first)?;
    let grid = doc
        .extract_table(idx)?
        .ok_or_else(|| ExtractError::EmptyInput(format!("no table on page {first}")))?;

    let mut rows: Vec<Row> = Vec::new();
    for row in grid {
        let cells = present_cells(row);
        if cells.iter().any(|c| c.contains(SENTINEL)) {
            break;
        }
        if cells.len() > COLUMNS.len() {
            return Err(ExtractError::mismatch(format!(
                "macro view row has {} cells, expected {}",
                cells.len(),
                COLUMNS.len()
            )));
        }
        // short rows are banner noise
        if cells.len() == COLUMNS.len() {
            rows.push(cells.iter().map(|c| Some(strip_commas(c))).collect());
        }
    }
    if rows.is_empty() {
        return Err(ExtractError::EmptyInput(format!(
            "macro view on page {first} has no complete rows"
        )));
    }
    debug!(page = first, metrics = rows.len(), "macro view rows collected");

    let headers = COLUMNS.iter().map(|s| s.to_string()).collect();
    let mut table = RawTable::new(headers, rows)
        .transpose("Board")
        .retain_rows(|r| r[0].as_deref() != Some(DROPPED_ROW))
        .promote_header()?;
    table.headers[0] = "Board".to_string();

    Ok(table
        .insert_column(1, "c_ex_id", Some(exchange_id.to_string()))
        .insert_column(2, "Date", Some(date.format("%Y-%m-%d").to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fake::{grid, FakePage, FakeReport};

    fn report(rows: &[&[&str]]) -> FakeReport {
        FakeReport::new(vec![
            FakePage::text("cover"),
            FakePage::text(crate::report::Section::MacroView.header()),
            FakePage::text("table").with_table(grid(rows)),
        ])
    }

    #[test]
    fn pivots_boards_into_rows() -> anyhow::Result<()> {
        let mut rows = grid(&[
            &["Listed Companies", "530", "Nos.", "10"],
            &["Market Capitalization", "7,512,004", "Rs. million", "1,200"],
            &["Turnover", "300,450,000", "Shares", "50,000"],
        ]);
        rows.insert(1, vec![None, Some("MAIN".into()), None, None]);
        rows.push(vec![None, Some(format!("SECTION 2: {SENTINEL}")), None]);
        rows.push(crate::table::row_of(&["After", "1", "2", "3"]));
        let mut doc = report(&[]);
        doc.pages[2].tables = vec![rows];

        let t = extract_macro_view(&doc, &[3], "1")?;
        assert_eq!(
            t.headers,
            vec![
                "Board",
                "c_ex_id",
                "Date",
                "Listed Companies",
                "Market Capitalization",
                "Turnover"
            ]
        );
        assert_eq!(t.len(), 2);
        assert_eq!(
            t.rows[0],
            crate::table::row_of(&["Main Board", "1", "2024-01-23", "530", "7512004", "300450000"])
        );
        assert_eq!(t.rows[1][0].as_deref(), Some("GEM Board"));
        assert_eq!(t.rows[1][4].as_deref(), Some("1200"));
        Ok(())
    }

    #[test]
    fn missing_creation_date_fails() {
        let mut doc = report(&[&["a", "b", "c", "d"]]);
        doc.creation_date = None;
        assert!(matches!(
            extract_macro_view(&doc, &[3], "1"),
            Err(ExtractError::DateParseError { .. })
        ));
    }

    #[test]
    fn wide_row_is_structural() {
        let doc = report(&[&["a", "b", "c", "d", "e"]]);
        assert!(matches!(
            extract_macro_view(&doc, &[3], "1"),
            Err(ExtractError::StructuralMismatch(_))
        ));
    }
}
