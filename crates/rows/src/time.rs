//! Timestamp conversion for time-typed columns.
//!
//! Databases hand back times as epoch seconds or date/time text. A [`TimeConverter`] turns
//! such a value into a [`Value::Time`]; it is passed explicitly to the
//! factories that need one instead of living in a global hook.

use crate::{RowError, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;

pub type TimeConverter = Arc<dyn Fn(Value) -> Result<Value, RowError> + Send + Sync>;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Convert epoch seconds (integer or float) or date/time text into a UTC time.
///
/// Text may be RFC 3339, or SQL-style `YYYY-MM-DD HH:MM:SS[.fff]` or
/// `YYYY-MM-DD`, the latter two read as UTC. Values that are already times
/// are returned as is.
pub fn utc_datetime(value: Value) -> Result<Value, RowError> {
    match value {
        Value::Integer(secs) => DateTime::<Utc>::from_timestamp(secs, 0)
            .map(Value::Time)
            .ok_or_else(|| RowError::TimeConversion(secs.to_string())),
        Value::Float(secs) => from_float_seconds(secs)
            .map(Value::Time)
            .ok_or_else(|| RowError::TimeConversion(format!("{secs:?}"))),
        Value::Text(s) => from_text(&s)
            .map(Value::Time)
            .ok_or_else(|| RowError::TimeConversion(format!("'{s}'"))),
        Value::Time(t) => Ok(Value::Time(t)),
        other => Err(RowError::TimeConversion(format!("{} value", other.type_name()))),
    }
}

fn from_float_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    // rounding can push the fraction up to a full second
    let nanos = (((secs - whole) * NANOS_PER_SEC).round() as u32).min(999_999_999);
    DateTime::<Utc>::from_timestamp(whole as i64, nanos)
}

fn from_text(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(t.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}
