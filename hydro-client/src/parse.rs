//! Parsing of the portal's CSV usage export.
//!
//! Columns, in order: date (`YYYY-MM-DD`), hour of day, usage in kWh,
//! time-of-use tier label, cost in dollars. Anything after the fifth column
//! is ignored. The first row is a header and is discarded without looking at
//! the column names.

use std::io::Read;

use csv::StringRecord;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration};

use crate::domain::{UsageRecord, PORTAL_OFFSET};
use crate::error::ParseError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

const MIN_COLUMNS: usize = 5;

/// Parse a whole CSV export into usage records.
///
/// Fail-fast: any malformed field aborts the entire parse, no partial result
/// is returned. Rows with exactly zero usage parse successfully but are
/// dropped from the output; negative usage (net-metering export) passes
/// through. Provider row order is preserved.
pub fn parse_usage_csv<R: Read>(reader: R) -> Result<Vec<UsageRecord>, ParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let record = parse_row(&row)?;
        if record.kwh != 0.0 {
            records.push(record);
        }
    }
    Ok(records)
}

fn parse_row(row: &StringRecord) -> Result<UsageRecord, ParseError> {
    if row.len() < MIN_COLUMNS {
        return Err(ParseError::MissingColumns {
            got: row.len(),
            expected: MIN_COLUMNS,
        });
    }

    let date_str = &row[0];
    let date = Date::parse(date_str, DATE_FORMAT).map_err(|source| ParseError::InvalidDate {
        value: date_str.to_string(),
        source,
    })?;

    // Parsed as u8 so a negative or absurdly large hour is rejected as
    // malformed instead of overflowing the duration arithmetic below.
    let hour_str = &row[1];
    let hour: u8 = hour_str
        .trim()
        .parse()
        .map_err(|source| ParseError::InvalidHour {
            value: hour_str.to_string(),
            source,
        })?;

    // The reading hour is whole hours past midnight of the reported date, in
    // the portal's fixed offset. Added as a duration so an hour of 24 rolls
    // into the next day rather than failing.
    let ts = date.midnight().assume_offset(PORTAL_OFFSET) + Duration::hours(i64::from(hour));

    let kwh = parse_number(&row[2], "usage")?;
    let peak = row[3].to_string();
    let cost = parse_number(&row[4], "cost")?;

    Ok(UsageRecord {
        ts,
        kwh,
        peak,
        cost,
    })
}

fn parse_number(value: &str, column: &'static str) -> Result<f64, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|source| ParseError::InvalidNumber {
            column,
            value: value.to_string(),
            source,
        })
}
