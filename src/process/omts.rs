// src/process/omts.rs
//! Off-market transaction CSVs: one file, two tables. Broker-to-broker trades
//! come first; client-to-client and institutional cross transactions follow a
//! blank separator row and one banner row.

use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::table::{RawTable, Row};

/// Report banner lines above the header row.
pub const METADATA_ROWS: usize = 4;

pub const BROKER_TRADE_COLUMNS: [&str; 9] = [
    "Date",
    "SETTLEMENT DATE",
    "BUYER",
    "SELLER",
    "SYMBOL CODE",
    "COMPANY",
    "TURNOVER",
    "RATE",
    "VALUES",
];

#[derive(Debug)]
pub struct OffMarketSplit {
    pub broker_trades: RawTable,
    pub cross_transactions: RawTable,
}

fn read_rows(data: &[u8], skip: usize) -> Result<RawTable> {
    let text = String::from_utf8_lossy(data);
    let body: String = text.split_inclusive('\n').skip(skip).collect();
    if body.trim().is_empty() {
        return Err(ExtractError::EmptyInput("no rows after report banner".into()));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(body.into_bytes()));

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows: Vec<Row> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|s| {
                    let s = s.trim();
                    (!s.is_empty()).then(|| s.to_string())
                })
                .collect(),
        );
    }
    Ok(RawTable::new(headers, rows))
}

/// Index of the first row holding any null cell.
pub fn separator_index(table: &RawTable) -> Option<usize> {
    table
        .rows
        .iter()
        .position(|row| row.iter().any(Option::is_none))
}

/// `"<x> <buyer> <y> <seller>"` → `(buyer, seller)`.
fn split_member_code(code: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = code.split(' ').collect();
    match parts.as_slice() {
        [_, buyer, _, seller] => Ok((buyer.to_string(), seller.to_string())),
        _ => Err(ExtractError::mismatch(format!(
            "MEMBER CODE {code:?} does not split into four parts"
        ))),
    }
}

fn split_buyer_seller(table: RawTable) -> Result<RawTable> {
    let (buyers, sellers): (Vec<_>, Vec<_>) = table
        .column("MEMBER CODE")?
        .map(|code| split_member_code(code.unwrap_or_default()))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .map(|(b, s)| (Some(b), Some(s)))
        .unzip();

    table
        .drop_columns(&["MEMBER CODE"])?
        .push_column("BUYER", buyers)?
        .push_column("SELLER", sellers)
}

pub fn split_off_market(data: &[u8]) -> Result<OffMarketSplit> {
    let table = read_rows(data, METADATA_ROWS)?;
    let sep = separator_index(&table).ok_or_else(|| {
        ExtractError::mismatch("no null-bearing separator row between the two blocks")
    })?;
    debug!(separator = sep, rows = table.len(), "splitting off-market report");

    let RawTable { headers, mut rows } = table;
    let tail: Vec<Row> = rows.drain(sep..).skip(2).collect();

    let broker = split_buyer_seller(RawTable::new(headers.clone(), rows))?
        .select(&BROKER_TRADE_COLUMNS)?;
    let cross = RawTable::new(headers, tail);

    Ok(OffMarketSplit {
        broker_trades: broker,
        cross_transactions: cross,
    })
}
