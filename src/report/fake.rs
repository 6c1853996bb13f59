// src/report/fake.rs
//! In-memory [`ReportDocument`] for extractor and locator tests.

use super::document::ReportDocument;
use crate::error::{ExtractError, Result};
use crate::table::{row_of, RawGrid};

#[derive(Debug, Default, Clone)]
pub struct FakePage {
    pub text: String,
    pub tables: Vec<RawGrid>,
}

impl FakePage {
    pub fn text(text: &str) -> Self {
        FakePage {
            text: text.to_string(),
            tables: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: RawGrid) -> Self {
        self.tables.push(table);
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct FakeReport {
    pub pages: Vec<FakePage>,
    pub creation_date: Option<String>,
}

impl FakeReport {
    pub fn new(pages: Vec<FakePage>) -> Self {
        FakeReport {
            pages,
            creation_date: Some("D:20240123153000+05'00'".into()),
        }
    }

    fn page(&self, index: usize) -> Result<&FakePage> {
        self.pages
            .get(index)
            .ok_or_else(|| ExtractError::MissingResource(format!("no page {index}")))
    }
}

impl ReportDocument for FakeReport {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        Ok(self.page(index)?.text.clone())
    }

    fn extract_table(&self, index: usize) -> Result<Option<RawGrid>> {
        Ok(self.page(index)?.tables.first().cloned())
    }

    fn extract_tables(&self, index: usize) -> Result<Vec<RawGrid>> {
        Ok(self.page(index)?.tables.clone())
    }

    fn creation_date(&self) -> Option<String> {
        self.creation_date.clone()
    }
}

pub fn grid(rows: &[&[&str]]) -> RawGrid {
    rows.iter().map(|r| row_of(r)).collect()
}
