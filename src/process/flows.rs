// src/process/flows.rs
//! Foreign / local investor portfolio flow files (`DD-MM-YYYYfipi.csv`,
//! `DD-MM-YYYYlipi.csv`).

use chrono::{Datelike, NaiveDate};
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Cursor;

use crate::error::{ExtractError, Result};
use crate::table::{clean_numeric, RawTable, Row};

pub const FLOW_TOKENS: [&str; 2] = ["fipi", "lipi"];

pub const NUMERIC_COLUMNS: [&str; 7] = [
    "BUY VOLUME",
    "BUY VALUE",
    "SELL VOLUME",
    "SELL VALUE",
    "NET VOLUME",
    "NET VALUE",
    "USD",
];

static FUTURE_CONTRACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"FUTURE CONTRACT-(\w+)").unwrap());

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

pub fn is_flow_stem(stem: &str) -> bool {
    let lower = stem.to_lowercase();
    FLOW_TOKENS.iter().any(|t| lower.contains(t))
}

/// `01-03-2024fipi` → 2024-03-01.
pub fn flow_date_from_stem(stem: &str) -> Result<NaiveDate> {
    let mut rest = stem.to_lowercase();
    for token in FLOW_TOKENS {
        rest = rest.replace(token, "");
    }
    let rest = rest.trim();
    NaiveDate::parse_from_str(rest, "%d-%m-%Y").map_err(|_| ExtractError::date(rest, "DD-MM-YYYY"))
}

/// `FUTURE CONTRACT-FEB` → `FUTURE CONTRACT`; everything else unchanged.
pub fn market_type_name(market_type: &str) -> String {
    if market_type.starts_with("FUTURE CONTRACT") {
        "FUTURE CONTRACT".to_string()
    } else {
        market_type.to_string()
    }
}

/// Month number of a `FUTURE CONTRACT-<MON>` market type, 0 otherwise.
pub fn future_contract_month(market_type: &str) -> u32 {
    FUTURE_CONTRACT
        .captures(market_type)
        .and_then(|c| {
            let name = c[1].to_uppercase();
            MONTHS.iter().position(|m| *m == name)
        })
        .map(|i| i as u32 + 1)
        .unwrap_or(0)
}

pub fn parse_flows(data: &[u8], stem: &str) -> Result<RawTable> {
    let date = flow_date_from_stem(stem)?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(data));
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows: Vec<Row> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        // blank-but-present cells survive untrimmed so CLIENT TYPE " " can be told apart
        rows.push(
            record
                .iter()
                .map(|s| (!s.is_empty()).then(|| s.to_string()))
                .collect(),
        );
    }
    if rows.is_empty() {
        return Err(ExtractError::EmptyInput(format!("{stem}: no flow rows")));
    }
    let table = RawTable::new(headers, rows);

    let sec = table.column_index("SEC CODE")?;
    let sector = table.column_index("SECTOR NAME")?;
    let client = table.column_index("CLIENT TYPE")?;
    let table = table
        .retain_rows(|r| {
            r[sec].is_some()
                && r[sector].is_some()
                && !r[client].as_deref().is_some_and(|c| c.trim().is_empty())
        })
        .map_cells(|c| c.trim().to_string());

    let market_types: Vec<String> = table
        .column("MARKET TYPE")?
        .map(|m| m.unwrap_or_default().to_string())
        .collect();
    let names = market_types
        .iter()
        .map(|m| Some(market_type_name(m)))
        .collect();
    let months = market_types
        .iter()
        .map(|m| Some(future_contract_month(m).to_string()))
        .collect();
    let mut table = table
        .push_column("market_type_name", names)?
        .push_column("FUTURE_CONTRACT_MONTH", months)?;

    for col in NUMERIC_COLUMNS {
        table = table.map_column(col, |v| {
            clean_numeric(Some(v)).map(|n| n.to_string()).unwrap_or_default()
        })?;
    }

    let n = table.len();
    Ok(table
        .insert_column(0, "Date", Some(date.format("%Y-%m-%d").to_string()))
        .push_column("Year", vec![Some(date.year().to_string()); n])?
        .push_column("Month", vec![Some(date.month().to_string()); n])?)
}
