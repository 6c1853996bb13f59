// src/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

/// Run settings. Every field has a default, so an absent or partial YAML
/// file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the exchange's download area.
    pub base_url: String,
    /// Where downloaded report files land and are enumerated from.
    pub data_dir: PathBuf,
    /// Where Parquet output and the run manifest are written.
    pub out_dir: PathBuf,
    pub download_concurrency: usize,
    /// Keep inputs after a run instead of deleting them.
    pub keep_downloads: bool,
    /// Constant `c_ex_id` stamped on macro-view rows.
    pub exchange_id: String,
    /// Report prefix → file extensions published under it.
    pub file_map: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        let file_map = [
            ("mkt_summary", ".Z"),
            ("omts", ".csv"),
            ("fut_opn_int", ".xls"),
            ("quote", ".pdf"),
            ("indhist", ".xls"),
        ]
        .into_iter()
        .map(|(prefix, ext)| (prefix.to_string(), vec![ext.to_string()]))
        .collect();

        Config {
            base_url: "https://dps.psx.com.pk/download".into(),
            data_dir: PathBuf::from("DataWarehouse"),
            out_dir: PathBuf::from("parquet"),
            download_concurrency: 3,
            keep_downloads: false,
            exchange_id: "1".into(),
            file_map,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text).context("invalid config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path` when given, else fall back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                Self::from_yaml(&text)
            }
            None => Ok(Config::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.download_concurrency == 0 {
            bail!("download_concurrency must be at least 1");
        }
        if self.file_map.values().flatten().any(|ext| !ext.starts_with('.')) {
            bail!("file_map extensions must start with '.'");
        }
        Ok(())
    }
}
