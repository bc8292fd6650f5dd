//! Conversions between chrono values and Glide date strings.
//!
//! ServiceNow serializes `GlideDate` as `YYYY-MM-DD` and `GlideDateTime` as
//! `YYYY-MM-DD HH:MM:SS`. Table API values are in UTC unless the caller asked
//! for display values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::Result;

/// `GlideDate` string layout.
pub const GLIDE_DATE_FORMAT: &str = "%Y-%m-%d";

/// `GlideDateTime` string layout.
pub const GLIDE_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a `GlideDateTime` string.
pub fn parse_glide_date_time(value: &str) -> Result<NaiveDateTime> {
    Ok(NaiveDateTime::parse_from_str(value.trim(), GLIDE_DATE_TIME_FORMAT)?)
}

/// Parse a `GlideDateTime` string stored in UTC.
pub fn parse_glide_date_time_utc(value: &str) -> Result<DateTime<Utc>> {
    Ok(parse_glide_date_time(value)?.and_utc())
}

/// Parse a `GlideDate` string.
pub fn parse_glide_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value.trim(), GLIDE_DATE_FORMAT)?)
}

pub fn format_glide_date(date: NaiveDate) -> String {
    date.format(GLIDE_DATE_FORMAT).to_string()
}

pub fn format_glide_date_time(date_time: NaiveDateTime) -> String {
    date_time.format(GLIDE_DATE_TIME_FORMAT).to_string()
}
