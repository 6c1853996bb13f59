// src/fetch/urls.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use url::Url;

use crate::config::Config;

/// One downloadable report: where it lives and what to call it locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportUrl {
    pub url: Url,
    pub file_name: String,
}

/// `{base_url}/{prefix}/{date}{ext}` for every prefix and extension in the
/// file map, saved as `{prefix}{date}{ext}`.
pub fn report_urls(config: &Config, date: NaiveDate) -> Result<Vec<ReportUrl>> {
    let date = date.format("%Y-%m-%d").to_string();
    let base = config.base_url.trim_end_matches('/');
    let mut out = Vec::new();
    for (prefix, extensions) in &config.file_map {
        for ext in extensions {
            let raw = format!("{base}/{prefix}/{date}{ext}");
            let url = Url::parse(&raw).with_context(|| format!("invalid report URL {raw}"))?;
            out.push(ReportUrl {
                url,
                file_name: format!("{prefix}{date}{ext}"),
            });
        }
    }
    Ok(out)
}
