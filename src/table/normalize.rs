// src/table/normalize.rs
use arrow::{
    array::{ArrayRef, Date32Array, Float64Array, StringArray, TimestampMillisecondArray},
    datatypes::{DataType, Field, Schema, TimeUnit},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use chrono::NaiveDate;
use std::{fmt, path::PathBuf, sync::Arc};

use super::clean::{clean_numeric, is_null, looks_numeric};
use super::date_parser::{parse_iso_date, parse_iso_datetime};
use super::RawTable;
use crate::error::Result;
use crate::report::Section;

/// What a table holds, so the storage side can route it without sniffing
/// column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    ReadyMarket,
    FutureMarket,
    BrokerTrades,
    CrossTransactions,
    IndexWeights,
    OpenInterest,
    FlowSummary,
    Section(Section),
}

impl TableKind {
    pub fn slug(&self) -> &'static str {
        match self {
            TableKind::ReadyMarket => "ready_market",
            TableKind::FutureMarket => "future_market",
            TableKind::BrokerTrades => "broker_trades",
            TableKind::CrossTransactions => "cross_transactions",
            TableKind::IndexWeights => "index_weights",
            TableKind::OpenInterest => "open_interest",
            TableKind::FlowSummary => "flow_summary",
            TableKind::Section(s) => s.slug(),
        }
    }

    /// Identifier columns that stay text even when every value is digits,
    /// so codes such as "0801" keep their leading zeros.
    pub fn text_columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::ReadyMarket | TableKind::FutureMarket => &["Symbol", "Sector Code"],
            TableKind::BrokerTrades | TableKind::CrossTransactions => {
                &["BUYER", "SELLER", "SYMBOL CODE"]
            }
            TableKind::IndexWeights => &["SYMBOL"],
            TableKind::OpenInterest => &["Symbol"],
            TableKind::FlowSummary => &["SEC CODE"],
            TableKind::Section(Section::MacroView) => &["Board", "c_ex_id"],
            TableKind::Section(Section::BoardMeetings) => &["Symbol"],
            TableKind::Section(Section::SectorIndex) => &["Sector Code"],
            TableKind::Section(Section::SixMonthSummary) => &[],
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Final output of one extraction: typed columns, no all-null rows.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub kind: TableKind,
    pub source: PathBuf,
    /// Date token from the source file name, when it carries one.
    pub report_date: Option<NaiveDate>,
    pub batch: RecordBatch,
}

impl NormalizedTable {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Date,
    Timestamp,
    Number,
    Text,
}

/// Pick the narrowest type every non-null value in the column agrees on.
fn infer_column_type(table: &RawTable, idx: usize) -> ColumnType {
    let mut values = table
        .rows
        .iter()
        .filter_map(|r| r[idx].as_deref())
        .filter(|s| !s.trim().is_empty())
        .peekable();
    if values.peek().is_none() {
        return ColumnType::Text;
    }
    let values: Vec<&str> = values.collect();
    if values.iter().all(|v| parse_iso_date(v).is_some()) {
        ColumnType::Date
    } else if values.iter().all(|v| parse_iso_datetime(v).is_some()) {
        ColumnType::Timestamp
    } else if values.iter().all(|v| looks_numeric(v)) {
        ColumnType::Number
    } else {
        ColumnType::Text
    }
}

fn build_column(table: &RawTable, idx: usize, ty: ColumnType) -> (DataType, ArrayRef) {
    let cells = table.rows.iter().map(|r| {
        let c = &r[idx];
        if is_null(c) {
            None
        } else {
            c.as_deref()
        }
    });
    match ty {
        ColumnType::Date => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
            let arr: Date32Array = cells
                .map(|c| {
                    c.and_then(parse_iso_date)
                        .map(|d| (d - epoch).num_days() as i32)
                })
                .collect();
            (DataType::Date32, Arc::new(arr))
        }
        ColumnType::Timestamp => {
            let arr: TimestampMillisecondArray = cells
                .map(|c| {
                    c.and_then(parse_iso_datetime)
                        .map(|dt| dt.and_utc().timestamp_millis())
                })
                .collect();
            (DataType::Timestamp(TimeUnit::Millisecond, None), Arc::new(arr))
        }
        ColumnType::Number => {
            let arr: Float64Array = cells.map(clean_numeric).collect();
            (DataType::Float64, Arc::new(arr))
        }
        ColumnType::Text => {
            let arr: StringArray = cells.map(|c| c.map(str::trim)).collect();
            (DataType::Utf8, Arc::new(arr))
        }
    }
}

impl RawTable {
    /// Type every column and seal the table into an Arrow batch.
    pub fn normalize(
        self,
        kind: TableKind,
        source: impl Into<PathBuf>,
        report_date: Option<NaiveDate>,
    ) -> Result<NormalizedTable> {
        let table = self.strip_null_rows();
        let mut fields = Vec::with_capacity(table.width());
        let mut columns = Vec::with_capacity(table.width());

        let text_columns = kind.text_columns();
        for (i, name) in table.headers.iter().enumerate() {
            let ty = if text_columns.contains(&name.as_str()) {
                ColumnType::Text
            } else {
                infer_column_type(&table, i)
            };
            let (dt, arr) = build_column(&table, i, ty);
            fields.push(Field::new(name, dt, true));
            columns.push(arr);
        }

        let options = RecordBatchOptions::new().with_row_count(Some(table.len()));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)?;

        Ok(NormalizedTable {
            kind,
            source: source.into(),
            report_date,
            batch,
        })
    }
}
