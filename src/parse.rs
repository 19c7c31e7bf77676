//! Purpose: Parse loosely formatted API values (timestamps, locale-formatted numbers).
//! Exports: `Timestamp`, `parse_datetime_string`, `parse_float_string`.
//! Role: Shared value decoding for API records and the CLI.
//! Invariants: Absent input is passed through as `None`, never treated as an error.
//! Invariants: Timestamps keep the input's specificity (zoned only when an offset is present).
//! Invariants: Number parsing never fails loudly; malformed numbers become `None`.

use crate::core::error::{Error, ErrorKind};
use bigdecimal::BigDecimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// A parsed point in time; naive when the input carried no offset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Timestamp {
    Zoned(OffsetDateTime),
    Naive(PrimitiveDateTime),
}

impl Timestamp {
    pub fn date(&self) -> Date {
        match self {
            Timestamp::Zoned(value) => value.date(),
            Timestamp::Naive(value) => value.date(),
        }
    }

    pub fn time(&self) -> Time {
        match self {
            Timestamp::Zoned(value) => value.time(),
            Timestamp::Naive(value) => value.time(),
        }
    }

    pub fn offset(&self) -> Option<UtcOffset> {
        match self {
            Timestamp::Zoned(value) => Some(value.offset()),
            Timestamp::Naive(_) => None,
        }
    }

    pub fn is_zoned(&self) -> bool {
        matches!(self, Timestamp::Zoned(_))
    }

    /// Zoned values are returned as-is; naive values are read as UTC.
    pub fn assume_utc(&self) -> OffsetDateTime {
        match self {
            Timestamp::Zoned(value) => *value,
            Timestamp::Naive(value) => value.assume_utc(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Timestamp::Zoned(value) => value.format(&Rfc3339),
            Timestamp::Naive(value) if value.nanosecond() == 0 => {
                value.format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
            }
            Timestamp::Naive(value) => value.format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"
            )),
        };
        f.write_str(&text.map_err(|_| fmt::Error)?)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses a date/time string; `None` passes through untouched.
///
/// Accepts RFC 3339, RFC 2822, ISO-like `date[T| ]time[offset]` forms,
/// bare dates (`2021-03-04`, `2021/03/04`, `20210304`) and written dates
/// such as `March 4, 2021` or `4 Mar 2021`.
pub fn parse_datetime_string(value: Option<&str>) -> Result<Option<Timestamp>, Error> {
    let Some(value) = value else {
        return Ok(None);
    };
    parse_timestamp(value.trim()).map(Some).ok_or_else(|| {
        Error::new(ErrorKind::Parse)
            .with_message(format!("unrecognized date/time string {value:?}"))
            .with_hint("Use an ISO-8601 form such as 2021-03-04 or 2021-03-04T12:30:00Z.")
    })
}

/// Parses a decimal that may carry `,` thousands separators.
///
/// Precision is unbounded: every digit of the input is kept.
pub fn parse_float_string(value: Option<&str>) -> Option<BigDecimal> {
    let cleaned = value?.replace(',', "");
    BigDecimal::from_str(cleaned.trim()).ok()
}

fn parse_timestamp(input: &str) -> Option<Timestamp> {
    if input.is_empty() {
        return None;
    }
    if let Ok(value) = OffsetDateTime::parse(input, &Rfc3339) {
        return Some(Timestamp::Zoned(value));
    }
    if let Ok(value) = OffsetDateTime::parse(input, &Rfc2822) {
        return Some(Timestamp::Zoned(value));
    }
    if let Some(date) = parse_date(input) {
        return Some(Timestamp::Naive(date.midnight()));
    }

    let split = input.find(['T', 't', ' '])?;
    let date = parse_date(&input[..split])?;
    let (clock, offset) = split_offset(input[split + 1..].trim())?;
    let naive = PrimitiveDateTime::new(date, parse_clock(clock)?);
    Some(match offset {
        Some(offset) => Timestamp::Zoned(naive.assume_offset(offset)),
        None => Timestamp::Naive(naive),
    })
}

fn parse_date(input: &str) -> Option<Date> {
    let formats = [
        format_description!("[year]-[month]-[day]"),
        format_description!("[year]/[month]/[day]"),
        format_description!("[year][month][day]"),
        format_description!("[month repr:long case_sensitive:false] [day padding:none], [year]"),
        format_description!("[month repr:short case_sensitive:false] [day padding:none], [year]"),
        format_description!("[month repr:long case_sensitive:false] [day padding:none] [year]"),
        format_description!("[month repr:short case_sensitive:false] [day padding:none] [year]"),
        format_description!("[day padding:none] [month repr:long case_sensitive:false] [year]"),
        format_description!("[day padding:none] [month repr:short case_sensitive:false] [year]"),
    ];
    formats
        .iter()
        .find_map(|format| Date::parse(input, format).ok())
}

fn parse_clock(input: &str) -> Option<Time> {
    let formats = [
        format_description!("[hour]:[minute]:[second].[subsecond]"),
        format_description!("[hour]:[minute]:[second]"),
        format_description!("[hour]:[minute]"),
    ];
    formats
        .iter()
        .find_map(|format| Time::parse(input, format).ok())
}

fn parse_offset(input: &str) -> Option<UtcOffset> {
    let formats = [
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
        format_description!("[offset_hour sign:mandatory][offset_minute]"),
        format_description!("[offset_hour sign:mandatory]"),
    ];
    formats
        .iter()
        .find_map(|format| UtcOffset::parse(input, format).ok())
}

/// Splits `12:30:00+02:00` into clock and offset parts. A trailing offset
/// that cannot be read makes the whole value unrecognized.
fn split_offset(input: &str) -> Option<(&str, Option<UtcOffset>)> {
    if let Some(clock) = input.strip_suffix(['Z', 'z']) {
        return Some((clock.trim_end(), Some(UtcOffset::UTC)));
    }
    for zone in [" UTC", " GMT"] {
        if let Some(clock) = input.strip_suffix(zone) {
            return Some((clock.trim_end(), Some(UtcOffset::UTC)));
        }
    }
    match input.rfind(['+', '-']) {
        Some(index) => {
            let offset = parse_offset(input[index..].trim())?;
            Some((input[..index].trim_end(), Some(offset)))
        }
        None => Some((input, None)),
    }
}
