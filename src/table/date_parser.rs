// src/table/date_parser.rs
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{ExtractError, Result};

/// Layouts seen across the exchange's listings, CSVs and PDF tables.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d%b%Y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%d %b %Y",
    "%b %d, %Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%Y%m%d",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M%p", "%I:%M:%S %p"];

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

/// Parse `"<date> <time>"`, splitting on the first whitespace.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    // Dates such as "23 Jan 2024" contain spaces themselves, so try every split.
    s.match_indices(char::is_whitespace).find_map(|(i, _)| {
        let (d, t) = s.split_at(i);
        Some(NaiveDateTime::new(parse_date(d)?, parse_time(t)?))
    })
}

/// Fast parse of `YYYY-MM-DD` only, used when typing normalized columns.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let b = s.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.len() != 19 || s.as_bytes()[10] != b' ' {
        return None;
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()
}

/// The first eight digits of `s` read as `YYYYMMDD`, e.g. a PDF
/// `CreationDate` of `D:20240123153000+05'00'`.
pub fn parse_compact_ymd(s: &str) -> Result<NaiveDate> {
    let digits: String = s.chars().filter(char::is_ascii_digit).take(8).collect();
    if digits.len() < 8 {
        return Err(ExtractError::date(s, "YYYYMMDD"));
    }
    NaiveDate::parse_from_str(&digits, "%Y%m%d").map_err(|_| ExtractError::date(s, "YYYYMMDD"))
}

/// Strip `token` from a file stem and parse the remainder strictly as
/// `DD-Mon-YYYY` (`indhist23-Jan-2024` → 2024-01-23).
pub fn date_from_stem(stem: &str, token: &str) -> Result<NaiveDate> {
    let rest = stem.rsplit(token).next().unwrap_or(stem).trim();
    NaiveDate::parse_from_str(rest, "%d-%b-%Y").map_err(|_| ExtractError::date(rest, "DD-Mon-YYYY"))
}

/// Extracts a report date from a file name, trying:
///  - a 10-char `YYYY-MM-DD` or `YYYY_MM_DD`
///  - an 8-digit contiguous `YYYYMMDD`
pub fn extract_date_from_filename(filename: &str) -> Option<NaiveDate> {
    let chars: Vec<char> = filename.chars().collect();

    for window in chars.windows(10) {
        let slice: String = window.iter().collect();
        let sep = window[4];
        if (sep == '-' || sep == '_') && window[7] == sep {
            let fmt = if sep == '-' { "%Y-%m-%d" } else { "%Y_%m_%d" };
            if let Ok(d) = NaiveDate::parse_from_str(&slice, fmt) {
                return Some(d);
            }
        }
    }

    for window in chars.windows(8) {
        if window.iter().all(|c| c.is_ascii_digit()) {
            let slice: String = window.iter().collect();
            if let Ok(d) = NaiveDate::parse_from_str(&slice, "%Y%m%d") {
                if (2000..=2100).contains(&chrono::Datelike::year(&d)) {
                    return Some(d);
                }
            }
        }
    }

    None
}
