// src/error.rs

use thiserror::Error;

/// Failures raised while turning one report file into tables.
///
/// The dispatcher catches every variant at the file (or section) boundary,
/// logs it and moves on; nothing here aborts a whole run.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    #[error("cannot parse date from {input:?} (expected {expected})")]
    DateParseError { input: String, expected: &'static str },

    #[error("missing resource: {0}")]
    MissingResource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl ExtractError {
    pub fn date(input: impl Into<String>, expected: &'static str) -> Self {
        ExtractError::DateParseError {
            input: input.into(),
            expected,
        }
    }

    pub fn mismatch(msg: impl Into<String>) -> Self {
        ExtractError::StructuralMismatch(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
