// src/process/market_summary.rs
use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::table::{date_parser::parse_date, RawTable, Row};

pub const COLUMNS: [&str; 10] = [
    "date",
    "Symbol",
    "Sector Code",
    "Name",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "LCDP",
];

/// Sector codes that belong to the deliverable-futures (derivatives) board.
pub const DERIVATIVE_SECTOR_CODES: [i64; 2] = [40, 41];

#[derive(Debug)]
pub struct MarketSummary {
    pub ready: RawTable,
    pub derivatives: RawTable,
}

pub fn is_derivative_sector(code: Option<&str>) -> bool {
    code.and_then(|c| c.trim().parse::<i64>().ok())
        .is_some_and(|c| DERIVATIVE_SECTOR_CODES.contains(&c))
}

/// Parse the pipe-delimited daily closing listing and split it into the
/// ready-market and derivatives-market subsets.
pub fn parse_market_summary(data: &[u8]) -> Result<MarketSummary> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(ExtractError::MalformedInput("market summary listing is empty".into()));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'|')
        .flexible(true)
        .from_reader(Cursor::new(data));

    let mut rows: Vec<Row> = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| {
            ExtractError::MalformedInput(format!("listing record {idx}: {e}"))
        })?;
        let mut row: Row = record
            .iter()
            .take(COLUMNS.len())
            .map(|s| {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            })
            .collect();
        row.resize(COLUMNS.len(), None);

        let raw_date = row[0].clone().unwrap_or_default();
        let date = parse_date(&raw_date).ok_or_else(|| ExtractError::date(raw_date, "DDMonYYYY"))?;
        row[0] = Some(date.format("%Y-%m-%d").to_string());
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ExtractError::MalformedInput("market summary listing has no rows".into()));
    }

    let (derivatives, ready): (Vec<Row>, Vec<Row>) = rows
        .into_iter()
        .partition(|r| is_derivative_sector(r[2].as_deref()));
    debug!(ready = ready.len(), derivatives = derivatives.len(), "split market summary");

    let headers: Vec<String> = COLUMNS.iter().map(|s| s.to_string()).collect();
    Ok(MarketSummary {
        ready: RawTable::new(headers.clone(), ready),
        derivatives: RawTable::new(headers, derivatives),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
23JAN2024|ABOT|11|ABBOTT LAB|500.1|510|495|505.5|12000|501|
23JAN2024|HBL-FEB|40|HBL FUT|100|101|99|100.5|3000|100|
23JAN2024|HBL|07|HABIB BANK|99|101|98|100|45000|99|
23JAN2024|OGDC-FEB|41|OGDC FUT|90|92|89|91|1500|90|extra|cols
";

    #[test]
    fn partitions_on_sector_code() -> anyhow::Result<()> {
        let out = parse_market_summary(LISTING.as_bytes())?;
        assert_eq!(out.ready.len(), 2);
        assert_eq!(out.derivatives.len(), 2);
        assert_eq!(out.ready.headers, COLUMNS.to_vec());

        let symbols = |t: &RawTable| -> Vec<String> {
            t.rows.iter().map(|r| r[1].clone().unwrap()).collect()
        };
        assert_eq!(symbols(&out.ready), vec!["ABOT", "HBL"]);
        assert_eq!(symbols(&out.derivatives), vec!["HBL-FEB", "OGDC-FEB"]);

        // union equals input, partitions disjoint
        let mut all = symbols(&out.ready);
        all.extend(symbols(&out.derivatives));
        all.sort();
        assert_eq!(all, vec!["ABOT", "HBL", "HBL-FEB", "OGDC-FEB"]);

        for row in &out.derivatives.rows {
            assert!(is_derivative_sector(row[2].as_deref()));
            assert_eq!(row.len(), 10);
        }
        for row in &out.ready.rows {
            assert!(!is_derivative_sector(row[2].as_deref()));
        }
        assert_eq!(out.ready.rows[0][0].as_deref(), Some("2024-01-23"));
        Ok(())
    }

    #[test]
    fn empty_listing_is_malformed() {
        assert!(matches!(
            parse_market_summary(b"  \n"),
            Err(ExtractError::MalformedInput(_))
        ));
        assert!(matches!(
            parse_market_summary(b""),
            Err(ExtractError::MalformedInput(_))
        ));
    }

    #[test]
    fn bad_date_fails() {
        assert!(matches!(
            parse_market_summary(b"yesterday|ABOT|11|X|1|1|1|1|1|1\n"),
            Err(ExtractError::DateParseError { .. })
        ));
    }
}
