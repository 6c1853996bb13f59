// src/sink.rs
//! Parquet output for a run's tables plus a JSON manifest describing them.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use parquet::{
    arrow::ArrowWriter,
    basic::Compression,
    file::properties::WriterProperties,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::process::file_stem;
use crate::table::NormalizedTable;

pub const MANIFEST_NAME: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub kind: String,
    pub source: PathBuf,
    pub report_date: Option<NaiveDate>,
    pub file: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
}

/// `{date}--{kind}--{stem}.parquet`, dated by the table's own report date
/// when it has one.
pub fn output_name(table: &NormalizedTable, run_date: NaiveDate) -> String {
    let date = table.report_date.unwrap_or(run_date);
    format!(
        "{}--{}--{}.parquet",
        date.format("%Y-%m-%d"),
        table.kind,
        file_stem(&table.source)
    )
}

/// Write one table under `out_dir` through a `.tmp` file renamed into place.
pub fn write_table(out_dir: &Path, run_date: NaiveDate, table: &NormalizedTable) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let final_path = out_dir.join(output_name(table, run_date));
    let tmp_path = final_path.with_extension("parquet.tmp");

    let file = File::create(&tmp_path).context("creating temporary Parquet file")?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, table.batch.schema(), Some(props))
        .context("initializing Parquet writer")?;
    writer.write(&table.batch).context("writing batch to Parquet")?;
    writer.close().context("closing Parquet writer")?;
    fs::rename(&tmp_path, &final_path).context("renaming Parquet file")?;

    debug!(file = %final_path.display(), rows = table.num_rows(), "wrote table");
    Ok(final_path)
}

/// Write every table and a manifest listing them.
pub fn write_all(
    out_dir: &Path,
    run_date: NaiveDate,
    tables: &[NormalizedTable],
) -> Result<Vec<ManifestEntry>> {
    let mut manifest = Vec::with_capacity(tables.len());
    for table in tables {
        let file = write_table(out_dir, run_date, table)?;
        manifest.push(ManifestEntry {
            kind: table.kind.to_string(),
            source: table.source.clone(),
            report_date: table.report_date,
            file,
            rows: table.num_rows(),
            columns: table.column_names(),
        });
    }
    let manifest_path = out_dir.join(MANIFEST_NAME);
    let json = serde_json::to_string_pretty(&manifest).context("serializing manifest")?;
    fs::create_dir_all(out_dir)?;
    fs::write(&manifest_path, json)
        .with_context(|| format!("writing {}", manifest_path.display()))?;
    info!(tables = manifest.len(), manifest = %manifest_path.display(), "wrote output");
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{row_of, RawTable, TableKind};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    fn sample() -> anyhow::Result<NormalizedTable> {
        let raw = RawTable::new(
            vec!["SYMBOL".into(), "IDX WT %".into(), "date".into()],
            vec![
                row_of(&["HBL", "3.5", "2024-01-23"]),
                row_of(&["ABOT", "1.25", "2024-01-23"]),
            ],
        );
        Ok(raw.normalize(
            TableKind::IndexWeights,
            "DataWarehouse/indhist23-Jan-2024.xls",
            None,
        )?)
    }

    #[test]
    fn writes_parquet_and_manifest() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let run_date = NaiveDate::from_ymd_opt(2024, 1, 23).unwrap();
        let table = sample()?;

        let manifest = write_all(dir.path(), run_date, &[table])?;
        assert_eq!(manifest.len(), 1);
        assert_eq!(
            manifest[0].file.file_name().unwrap().to_string_lossy(),
            "2024-01-23--index_weights--indhist23-Jan-2024.parquet"
        );

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&manifest[0].file)?)?
            .build()?;
        let rows: usize = reader.map(|b| b.map(|b| b.num_rows())).sum::<Result<usize, _>>()?;
        assert_eq!(rows, 2);

        let text = fs::read_to_string(dir.path().join(MANIFEST_NAME))?;
        let parsed: Vec<ManifestEntry> = serde_json::from_str(&text)?;
        assert_eq!(parsed, manifest);
        assert_eq!(parsed[0].columns, vec!["SYMBOL", "IDX WT %", "date"]);
        Ok(())
    }
}
