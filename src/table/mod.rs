// src/table/mod.rs
pub mod clean;
pub mod date_parser;
pub mod normalize;

pub use clean::{clean_numeric, normalize_headers, strip_null_rows};
pub use normalize::{NormalizedTable, TableKind};

use crate::error::{ExtractError, Result};

/// One cell as a parser or a PDF page hands it over; `None` is an absent cell.
pub type Cell = Option<String>;
pub type Row = Vec<Cell>;

/// Ragged rows straight out of a source. Nothing guarantees equal lengths.
pub type RawGrid = Vec<Row>;

/// A grid with named columns, the working shape every parser and extractor
/// reshapes before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// Every row is exactly `headers.len()` cells wide.
    pub rows: Vec<Row>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        let width = headers.len();
        let rows = rows.into_iter().map(|r| fit_row(r, width)).collect();
        RawTable { headers, rows }
    }

    /// Pad a ragged grid to its widest row. Columns are named by position
    /// ("0", "1", ...) until something better is assigned.
    pub fn from_grid(grid: RawGrid) -> Self {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        let headers = (0..width).map(|i| i.to_string()).collect();
        RawTable::new(headers, grid)
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Use the first row as column names and drop it from the body.
    pub fn promote_header(mut self) -> Result<Self> {
        if self.rows.is_empty() {
            return Err(ExtractError::EmptyInput(
                "no row available to promote to header".into(),
            ));
        }
        let first = self.rows.remove(0);
        self.headers = first.into_iter().map(Option::unwrap_or_default).collect();
        Ok(self)
    }

    /// Replace every column name; the count must match the current width.
    pub fn with_columns(mut self, names: &[&str]) -> Result<Self> {
        if names.len() != self.width() {
            return Err(ExtractError::mismatch(format!(
                "expected {} columns, table has {}",
                names.len(),
                self.width()
            )));
        }
        self.headers = names.iter().map(|s| s.to_string()).collect();
        Ok(self)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ExtractError::mismatch(format!("column {name:?} not found")))
    }

    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = Option<&str>> + '_> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |r| r[idx].as_deref()))
    }

    pub fn drop_column_at(mut self, idx: usize) -> Self {
        if idx < self.width() {
            self.headers.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
        self
    }

    pub fn drop_columns(mut self, names: &[&str]) -> Result<Self> {
        for name in names {
            let idx = self.column_index(name)?;
            self = self.drop_column_at(idx);
        }
        Ok(self)
    }

    /// Keep only `names`, in that order.
    pub fn select(self, names: &[&str]) -> Result<Self> {
        let idxs = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<Vec<_>>>()?;
        let rows = self
            .rows
            .into_iter()
            .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(RawTable {
            headers: names.iter().map(|s| s.to_string()).collect(),
            rows,
        })
    }

    pub fn insert_column(mut self, idx: usize, name: &str, value: Cell) -> Self {
        let idx = idx.min(self.width());
        self.headers.insert(idx, name.to_string());
        for row in &mut self.rows {
            row.insert(idx, value.clone());
        }
        self
    }

    pub fn push_column(self, name: &str, values: Vec<Cell>) -> Result<Self> {
        if values.len() != self.len() {
            return Err(ExtractError::mismatch(format!(
                "column {name:?} has {} values for {} rows",
                values.len(),
                self.len()
            )));
        }
        let mut out = self;
        out.headers.push(name.to_string());
        for (row, v) in out.rows.iter_mut().zip(values) {
            row.push(v);
        }
        Ok(out)
    }

    /// Drop rows holding any absent cell.
    pub fn drop_incomplete_rows(mut self) -> Self {
        self.rows.retain(|row| row.iter().all(Option::is_some));
        self
    }

    pub fn retain_rows<F: FnMut(&Row) -> bool>(mut self, f: F) -> Self {
        self.rows.retain(f);
        self
    }

    pub fn skip_rows(mut self, n: usize) -> Self {
        self.rows.drain(..n.min(self.rows.len()));
        self
    }

    pub fn map_cells<F: Fn(&str) -> String>(mut self, f: F) -> Self {
        for row in &mut self.rows {
            for cell in row.iter_mut().flatten() {
                *cell = f(cell);
            }
        }
        self
    }

    pub fn map_headers<F: Fn(&str) -> String>(mut self, f: F) -> Self {
        self.headers = self.headers.iter().map(|h| f(h)).collect();
        self
    }

    pub fn map_column<F: Fn(&str) -> String>(mut self, name: &str, f: F) -> Result<Self> {
        let idx = self.column_index(name)?;
        for row in &mut self.rows {
            if let Some(cell) = row[idx].as_mut() {
                *cell = f(cell);
            }
        }
        Ok(self)
    }

    /// Swap rows and columns. The old column names land in a new leading
    /// `index_name` column; the old rows become columns named by position.
    pub fn transpose(self, index_name: &str) -> Self {
        let mut headers = vec![index_name.to_string()];
        headers.extend((0..self.len()).map(|i| i.to_string()));
        let rows = self
            .headers
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let mut row = vec![Some(name.clone())];
                row.extend(self.rows.iter().map(|r| r[j].clone()));
                row
            })
            .collect();
        RawTable { headers, rows }
    }

    /// Row-wise concatenation, aligning columns by name. Columns only one
    /// side has are filled with absent cells on the other.
    pub fn append(self, other: RawTable) -> Self {
        if self.headers.is_empty() && self.rows.is_empty() {
            return other;
        }
        if self.headers == other.headers {
            let mut out = self;
            out.rows.extend(other.rows);
            return out;
        }
        let mut headers = self.headers.clone();
        for h in &other.headers {
            if !headers.contains(h) {
                headers.push(h.clone());
            }
        }
        let realign = |table: RawTable| -> Vec<Row> {
            let positions: Vec<Option<usize>> = headers
                .iter()
                .map(|h| table.headers.iter().position(|x| x == h))
                .collect();
            table
                .rows
                .into_iter()
                .map(|row| {
                    positions
                        .iter()
                        .map(|p| p.and_then(|i| row[i].clone()))
                        .collect()
                })
                .collect()
        };
        let mut rows = realign(self);
        rows.extend(realign(other));
        RawTable { headers, rows }
    }
}

fn fit_row(mut row: Row, width: usize) -> Row {
    row.resize(width, None);
    row
}

/// Shorthand used by tests and parsers to lift string slices into a row.
pub fn row_of(cells: &[&str]) -> Row {
    cells.iter().map(|c| Some(c.to_string())).collect()
}
