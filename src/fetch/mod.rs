// src/fetch/mod.rs
//! Getting a day's report files onto disk and finding them again.
pub mod download;
pub mod files;
pub mod urls;

pub use download::{download_all, download_file};
pub use files::{delete_files, has_files_for, list_files};
pub use urls::{report_urls, ReportUrl};
