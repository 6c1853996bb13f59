// src/table/clean.rs
//! Cell and row cleanup shared by every parser.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Cell, RawGrid, RawTable};

static PAREN_NEGATIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((.*?)\)").unwrap());
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d.\-]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NEWLINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());

/// `(1,234.5)` → `-1234.5`. Anything that is not a number after stripping
/// everything but digits, `-` and `.` comes back as `None`; never panics.
pub fn clean_numeric(cell: Option<&str>) -> Option<f64> {
    let raw = cell?;
    let negated = PAREN_NEGATIVE.replace_all(raw, "-$1");
    let digits = NON_NUMERIC.replace_all(&negated, "");
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// True when a value reads as a number once separators, parentheses,
/// whitespace and a trailing `%` are removed. Stricter than
/// [`clean_numeric`], which happily pulls digits out of `"A-1"`.
pub fn looks_numeric(raw: &str) -> bool {
    let stripped: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')') && !c.is_whitespace())
        .collect();
    !stripped.is_empty() && stripped.parse::<f64>().is_ok()
}

pub fn is_null(cell: &Cell) -> bool {
    cell.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Drop rows in which every cell is absent or blank.
pub fn strip_null_rows(grid: RawGrid) -> RawGrid {
    grid.into_iter()
        .filter(|row| !row.iter().all(is_null))
        .collect()
}

/// Trim each header cell and fold embedded line breaks into one space.
pub fn normalize_headers(row: &[Cell]) -> Vec<Cell> {
    row.iter()
        .map(|c| c.as_deref().map(fold_newlines))
        .collect()
}

pub fn fold_newlines(s: &str) -> String {
    NEWLINE_RUN.replace_all(s.trim(), " ").into_owned()
}

pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").into_owned()
}

pub fn strip_commas(s: &str) -> String {
    s.replace(',', "")
}

impl RawTable {
    pub fn strip_null_rows(mut self) -> Self {
        self.rows = strip_null_rows(self.rows);
        self
    }

    pub fn normalize_headers(mut self) -> Self {
        self.headers = self.headers.iter().map(|h| fold_newlines(h)).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::row_of;

    #[test]
    fn clean_numeric_cases() {
        assert_eq!(clean_numeric(Some("(1,234.5)")), Some(-1234.5));
        assert_eq!(clean_numeric(Some("1,000")), Some(1000.0));
        assert_eq!(clean_numeric(Some(" -7.25 ")), Some(-7.25));
        assert_eq!(clean_numeric(Some("")), None);
        assert_eq!(clean_numeric(Some("abc")), None);
        assert_eq!(clean_numeric(None), None);
        assert_eq!(clean_numeric(Some("1.2.3")), None);
    }

    #[test]
    fn looks_numeric_is_strict() {
        assert!(looks_numeric("1,234"));
        assert!(looks_numeric("(12.5)"));
        assert!(looks_numeric("3.4%"));
        assert!(!looks_numeric("A-1"));
        assert!(!looks_numeric(""));
        assert!(!looks_numeric("23-Jan-2024"));
    }

    #[test]
    fn strip_null_rows_keeps_partial_rows() {
        let grid = vec![
            vec![None, Some("  ".into())],
            vec![None, Some("x".into())],
            vec![],
        ];
        let out = strip_null_rows(grid);
        assert_eq!(out, vec![vec![None, Some("x".into())]]);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let grid = vec![row_of(&["a", "1"]), vec![None, None], row_of(&["b", "2"])];
        let once = strip_null_rows(grid);
        let twice = strip_null_rows(once.clone());
        assert_eq!(once, twice);

        let headers = vec![Some(" Sector\nName ".into()), None];
        let h1 = normalize_headers(&headers);
        assert_eq!(h1[0].as_deref(), Some("Sector Name"));
        assert_eq!(normalize_headers(&h1), h1);
    }
}
