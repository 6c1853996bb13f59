// src/process/workbook.rs
use calamine::{open_workbook_auto, DataType, Range, Reader};
use std::path::Path;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::table::{
    clean::{fold_newlines, is_null},
    date_parser::date_from_stem,
    Cell, RawGrid, RawTable,
};

/// File-name token preceding the date in index-weight workbooks.
pub const INDEX_WEIGHT_TOKEN: &str = "indhist";
pub const INDEX_WEIGHT_COLUMNS: [&str; 3] = ["SYMBOL", "IDX WT %", "ORD SHARES"];

pub const OPEN_INTEREST_COLUMNS: [&str; 7] = [
    "Symbol",
    "Category",
    "OI Contract",
    "OI Volume",
    "OI Value",
    "FF of Script",
    "% FF",
];
/// Rows above the open-interest header.
const OPEN_INTEREST_HEADER_SKIP: usize = 2;
/// Banner rows below the header before the first contract.
const OPEN_INTEREST_BODY_SKIP: usize = 3;

fn cell_text(cell: &DataType) -> Cell {
    match cell {
        DataType::Empty => None,
        DataType::Error(_) => None,
        DataType::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        DataType::Float(v) => Some(format!("{v}")),
        DataType::Int(v) => Some(format!("{v}")),
        DataType::Bool(b) => Some(b.to_string()),
        DataType::DateTime(v) | DataType::Duration(v) => Some(format!("{v}")),
        DataType::DateTimeIso(s) | DataType::DurationIso(s) => Some(s.clone()),
    }
}

/// Lay a sheet out from A1, so positional skips count from the sheet top
/// even when calamine trims leading empty rows and columns.
fn range_to_grid(range: &Range<DataType>) -> RawGrid {
    let (row_off, col_off) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    let mut grid: RawGrid = vec![Vec::new(); row_off];
    for row in range.rows() {
        let mut out = vec![None; col_off];
        out.extend(row.iter().map(cell_text));
        grid.push(out);
    }
    grid
}

/// Read sheet `index` (0-based) of the workbook at `path`.
pub fn read_sheet<P: AsRef<Path>>(path: P, index: usize) -> Result<RawGrid> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;
    let sheets = workbook.sheet_names().to_owned();
    let range = workbook.worksheet_range_at(index).ok_or_else(|| {
        ExtractError::mismatch(format!(
            "{} has {} sheet(s), wanted sheet #{}",
            path.display(),
            sheets.len(),
            index + 1
        ))
    })??;
    debug!(path = %path.display(), sheet = index, rows = range.height(), "read sheet");
    Ok(range_to_grid(&range))
}

/// Index-weight history: the single data sheet, three columns kept, the
/// record date taken from the file stem.
pub fn parse_index_weights(grid: RawGrid, stem: &str) -> Result<RawTable> {
    let date = date_from_stem(stem, INDEX_WEIGHT_TOKEN)?;
    let grid: RawGrid = grid
        .into_iter()
        .skip_while(|r| r.iter().all(is_null))
        .collect();
    if grid.is_empty() {
        return Err(ExtractError::EmptyInput(format!("{stem}: sheet has no rows")));
    }

    let table = RawTable::from_grid(grid)
        .promote_header()?
        .map_headers(fold_newlines)
        .select(&INDEX_WEIGHT_COLUMNS)?
        .strip_null_rows();
    Ok(table.insert_column(
        INDEX_WEIGHT_COLUMNS.len(),
        "date",
        Some(date.format("%Y-%m-%d").to_string()),
    ))
}

pub fn read_index_weights<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    parse_index_weights(read_sheet(path, 0)?, &super::file_stem(path))
}

fn trim_trailing_null_columns(mut table: RawTable) -> RawTable {
    while table.width() > 0 {
        let last = table.width() - 1;
        if table.rows.iter().all(|r| r[last].is_none()) {
            table = table.drop_column_at(last);
        } else {
            break;
        }
    }
    table
}

/// Open-interest workbook, second sheet: two banner rows, a header whose
/// first column is a row index, three more banner rows, then contracts.
pub fn parse_open_interest(grid: RawGrid) -> Result<RawTable> {
    let table = RawTable::from_grid(grid).skip_rows(OPEN_INTEREST_HEADER_SKIP);
    if table.is_empty() {
        return Err(ExtractError::EmptyInput("open-interest sheet has no header".into()));
    }
    let table = table.skip_rows(1).drop_column_at(0);
    let table = trim_trailing_null_columns(table)
        .with_columns(&OPEN_INTEREST_COLUMNS)?
        .skip_rows(OPEN_INTEREST_BODY_SKIP)
        .drop_incomplete_rows();
    Ok(table)
}

pub fn read_open_interest<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    parse_open_interest(read_sheet(path, 1)?)
}
