// src/dispatch.rs
//! Route each downloaded report file to its parser and collect the
//! normalized tables of one run.

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, warn, Dispatch};

use crate::config::Config;
use crate::error::Result;
use crate::process::{self, archive, flows, market_summary, omts, workbook};
use crate::report::{locate_sections, PdfReport, ReportDocument, Section};
use crate::table::{date_parser::extract_date_from_filename, NormalizedTable, RawTable, TableKind};

/// Stem prefix of the open-interest workbook; other workbooks are index weights.
pub const OPEN_INTEREST_PREFIX: &str = "fut_opn_int";

/// One input file, identified by path, stem and lower-cased extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub path: PathBuf,
    pub stem: String,
    pub extension: String,
}

impl ReportFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = process::file_stem(&path);
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        ReportFile {
            path,
            stem,
            extension,
        }
    }
}

/// Group files by extension, groups and members in first-encounter order.
pub fn group_by_extension(files: Vec<ReportFile>) -> Vec<(String, Vec<ReportFile>)> {
    let mut groups: Vec<(String, Vec<ReportFile>)> = Vec::new();
    for file in files {
        match groups.iter_mut().find(|(ext, _)| *ext == file.extension) {
            Some((_, members)) => members.push(file),
            None => groups.push((file.extension.clone(), vec![file])),
        }
    }
    groups
}

/// Run every located section's extractor; a failing section is logged and
/// left out.
pub fn extract_report<D: ReportDocument + ?Sized>(
    doc: &D,
    exchange_id: &str,
) -> Result<Vec<(Section, RawTable)>> {
    let index = locate_sections(doc, &Section::ALL)?;
    let mut out = Vec::new();
    for (section, pages) in index.iter() {
        match section.extract(doc, pages, exchange_id) {
            Ok(table) => {
                debug!(section = section.slug(), ?pages, rows = table.len(), "extracted section");
                out.push((section, table));
            }
            Err(e) => error!(section = section.slug(), ?pages, error = %e, "section extraction failed"),
        }
    }
    Ok(out)
}

pub struct Dispatcher {
    dispatch: Dispatch,
    exchange_id: String,
}

impl Dispatcher {
    /// `dispatch` receives every event emitted during a run.
    pub fn new(config: &Config, dispatch: Dispatch) -> Self {
        Dispatcher {
            dispatch,
            exchange_id: config.exchange_id.clone(),
        }
    }

    /// Parse every file, in order. Files that fail are logged and skipped.
    pub fn run(&self, files: &[PathBuf]) -> Vec<NormalizedTable> {
        tracing::dispatcher::with_default(&self.dispatch, || {
            let files = files.iter().map(ReportFile::new).collect();
            let mut tables = Vec::new();
            for (ext, group) in group_by_extension(files) {
                debug!(extension = %ext, files = group.len(), "dispatching group");
                for file in group {
                    match self.route(&file) {
                        Ok(mut out) => {
                            info!(file = %file.path.display(), tables = out.len(), "parsed");
                            tables.append(&mut out);
                        }
                        Err(e) => error!(file = %file.path.display(), error = %e, "skipping file"),
                    }
                }
            }
            info!(tables = tables.len(), "run complete");
            tables
        })
    }

    #[tracing::instrument(level = "info", skip(self, file), fields(file = %file.path.display()))]
    fn route(&self, file: &ReportFile) -> Result<Vec<NormalizedTable>> {
        let date = extract_date_from_filename(&file.stem);
        let norm = |table: RawTable, kind: TableKind| table.normalize(kind, file.path.clone(), date);

        match file.extension.as_str() {
            "z" | "zip" => {
                let (_, listing) = archive::read_listing(&file.path)?;
                let summary = market_summary::parse_market_summary(&listing)?;
                Ok(vec![
                    norm(summary.ready, TableKind::ReadyMarket)?,
                    norm(summary.derivatives, TableKind::FutureMarket)?,
                ])
            }
            "csv" => {
                let data = read_file(&file.path)?;
                if flows::is_flow_stem(&file.stem) {
                    let table = flows::parse_flows(&data, &file.stem)?;
                    Ok(vec![norm(table, TableKind::FlowSummary)?])
                } else {
                    let split = omts::split_off_market(&data)?;
                    Ok(vec![
                        norm(split.broker_trades, TableKind::BrokerTrades)?,
                        norm(split.cross_transactions, TableKind::CrossTransactions)?,
                    ])
                }
            }
            "xls" | "xlsx" => {
                if file.stem.to_lowercase().starts_with(OPEN_INTEREST_PREFIX) {
                    Ok(vec![norm(workbook::read_open_interest(&file.path)?, TableKind::OpenInterest)?])
                } else {
                    Ok(vec![norm(workbook::read_index_weights(&file.path)?, TableKind::IndexWeights)?])
                }
            }
            "pdf" => {
                let report = PdfReport::open(&file.path)?;
                extract_report(&report, &self.exchange_id)?
                    .into_iter()
                    .map(|(section, table)| norm(table, TableKind::Section(section)))
                    .collect()
            }
            other => {
                warn!(extension = %other, "no parser for extension");
                Ok(Vec::new())
            }
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(crate::error::ExtractError::MissingResource(format!(
            "{} does not exist",
            path.display()
        )));
    }
    Ok(fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::archive::tests::zip_of;
    use crate::report::fake::{grid, FakePage, FakeReport};
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn test_dispatch() -> Dispatch {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::new("debug"))
            .with_test_writer()
            .finish();
        Dispatch::new(subscriber)
    }

    const OMTS: &str = "\
PAKISTAN STOCK EXCHANGE
OFF MARKET TRANSACTIONS
23-Jan-2024

Date,SETTLEMENT DATE,MEMBER CODE,SYMBOL CODE,COMPANY,TURNOVER,RATE,VALUES
2024-01-23,2024-01-24,B 101 S 202,HBL,Habib Bank,100,99.5,9950
,,,,,,,
CROSS TRANSACTIONS,,,,,,,
2024-01-23,2024-01-24,C 303 C 404,OGDC,Oil & Gas,50,80,4000
";

    #[test]
    fn groups_keep_encounter_order() {
        let files = ["a.csv", "b.PDF", "c.csv", "d.Z"]
            .iter()
            .map(ReportFile::new)
            .collect();
        let groups = group_by_extension(files);
        let exts: Vec<_> = groups.iter().map(|(e, _)| e.as_str()).collect();
        assert_eq!(exts, vec!["csv", "pdf", "z"]);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1].stem, "c");
    }

    #[test]
    fn routes_files_and_skips_failures() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let zip = dir.path().join("mkt_summary2024-01-23.Z");
        fs::write(
            &zip,
            zip_of(&[(
                "closing.lis",
                "23JAN2024|ABOT|11|ABBOTT|1|1|1|1|1|1\n23JAN2024|HBL-FEB|40|HBL FUT|1|1|1|1|1|1\n",
            )])?,
        )?;
        let omts_path = dir.path().join("omts2024-01-23.csv");
        fs::write(&omts_path, OMTS)?;
        let broken = dir.path().join("broken2024-01-23.csv");
        fs::write(&broken, "nothing useful\n")?;
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "ignored")?;

        let dispatcher = Dispatcher::new(&Config::default(), test_dispatch());
        let tables = dispatcher.run(&[zip.clone(), omts_path.clone(), broken, notes]);

        let kinds: Vec<_> = tables.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TableKind::ReadyMarket,
                TableKind::FutureMarket,
                TableKind::BrokerTrades,
                TableKind::CrossTransactions
            ]
        );
        assert_eq!(tables[0].source, zip);
        assert_eq!(
            tables[2].report_date,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 23)
        );
        assert_eq!(tables[2].num_rows(), 1);
        assert_eq!(tables[3].num_rows(), 1);
        Ok(())
    }

    #[test]
    fn routes_workbooks_by_stem_prefix() -> anyhow::Result<()> {
        use crate::process::workbook::tests::{write_index_weights, write_open_interest};

        let dir = tempfile::tempdir()?;
        let oi = dir.path().join("fut_opn_int23-Jan-2024.xlsx");
        write_open_interest(&oi)?;
        let weights = dir.path().join("indhist23-Jan-2024.xlsx");
        write_index_weights(&weights)?;

        let dispatcher = Dispatcher::new(&Config::default(), test_dispatch());
        let tables = dispatcher.run(&[oi.clone(), weights.clone()]);

        let kinds: Vec<_> = tables.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TableKind::OpenInterest, TableKind::IndexWeights]);
        assert_eq!(tables[0].source, oi);
        assert_eq!(tables[0].num_rows(), 2);
        assert_eq!(tables[1].source, weights);
        assert_eq!(tables[1].num_rows(), 1);
        Ok(())
    }

    #[test]
    fn failing_section_does_not_drop_the_others() -> anyhow::Result<()> {
        let six_month = grid(&[
            &[Section::SixMonthSummary.header()],
            &["Dec-2023", "1", "2", "3", "4", "5", "6"],
        ]);
        let mut doc = FakeReport::new(vec![
            FakePage::text("cover"),
            FakePage::text(&format!(
                "{} {}",
                Section::MacroView.header(),
                Section::SixMonthSummary.header()
            )),
            FakePage::default()
                .with_table(six_month)
                .with_table(grid(&[&["x"]])),
        ]);
        doc.creation_date = None;

        let out = tracing::dispatcher::with_default(&test_dispatch(), || extract_report(&doc, "1"))?;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, Section::SixMonthSummary);
        assert_eq!(out[0].1.len(), 1);
        Ok(())
    }
}
