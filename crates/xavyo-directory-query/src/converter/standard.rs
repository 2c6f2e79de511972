//! Protocol-generic converters: booleans, integers and generalized time.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

use super::{names, AttributeConverter};
use crate::error::{QueryError, QueryResult};
use crate::value::{AttributeValue, RawValue, GENERALIZED_TIME_FORMAT};

/// LDAP boolean syntax: `TRUE` / `FALSE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolConverter;

impl AttributeConverter for BoolConverter {
    fn to_directory(&self, value: &AttributeValue) -> QueryResult<RawValue> {
        let flag = match value {
            AttributeValue::Boolean(b) => *b,
            AttributeValue::Integer(i) => *i != 0,
            AttributeValue::String(s) => parse_bool(s)
                .ok_or_else(|| QueryError::conversion(names::BOOL, format!("'{s}' is not a boolean")))?,
            other => {
                return Err(QueryError::conversion(
                    names::BOOL,
                    format!("cannot convert a {} value", other.kind()),
                ))
            }
        };
        Ok(RawValue::Text(if flag { "TRUE" } else { "FALSE" }.to_string()))
    }

    fn from_directory(&self, value: &RawValue) -> QueryResult<AttributeValue> {
        let text = require_text(names::BOOL, value)?;
        parse_bool(text)
            .map(AttributeValue::Boolean)
            .ok_or_else(|| QueryError::conversion(names::BOOL, format!("'{text}' is not a boolean")))
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// LDAP integer syntax.
///
/// Reading is lenient: the leading signed digit run of the stored value is
/// used, so `19960622123421Z` reads as `19960622123421`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntConverter;

impl AttributeConverter for IntConverter {
    fn to_directory(&self, value: &AttributeValue) -> QueryResult<RawValue> {
        match value {
            AttributeValue::Integer(i) => Ok(RawValue::Text(i.to_string())),
            AttributeValue::Boolean(b) => Ok(RawValue::Text(i64::from(*b).to_string())),
            AttributeValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| RawValue::Text(i.to_string()))
                .map_err(|_| QueryError::conversion(names::INT, format!("'{s}' is not an integer"))),
            other => Err(QueryError::conversion(
                names::INT,
                format!("cannot convert a {} value", other.kind()),
            )),
        }
    }

    fn from_directory(&self, value: &RawValue) -> QueryResult<AttributeValue> {
        let text = require_text(names::INT, value)?;
        leading_integer(text)
            .map(AttributeValue::Integer)
            .ok_or_else(|| QueryError::conversion(names::INT, format!("'{text}' is not an integer")))
    }
}

/// Parse the leading `[+-]?\d+` run of a string.
pub(crate) fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

/// Generalized time (RFC 4517 3.3.13), e.g. `19960622123421Z`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralizedTimeConverter;

impl AttributeConverter for GeneralizedTimeConverter {
    fn to_directory(&self, value: &AttributeValue) -> QueryResult<RawValue> {
        to_generalized_time(names::GENERALIZED_TIME, value, GENERALIZED_TIME_FORMAT)
    }

    fn from_directory(&self, value: &RawValue) -> QueryResult<AttributeValue> {
        let text = require_text(names::GENERALIZED_TIME, value)?;
        parse_generalized_time(text)
            .map(AttributeValue::DateTime)
            .ok_or_else(|| {
                QueryError::conversion(
                    names::GENERALIZED_TIME,
                    format!("'{text}' is not a generalized time"),
                )
            })
    }
}

pub(crate) fn to_generalized_time(
    converter: &str,
    value: &AttributeValue,
    format: &str,
) -> QueryResult<RawValue> {
    let dt = match value {
        AttributeValue::DateTime(dt) => *dt,
        AttributeValue::String(s) => parse_generalized_time(s).ok_or_else(|| {
            QueryError::conversion(converter, format!("'{s}' is not a generalized time"))
        })?,
        AttributeValue::Integer(ts) => DateTime::from_timestamp(*ts, 0).ok_or_else(|| {
            QueryError::conversion(converter, format!("timestamp {ts} is out of range"))
        })?,
        other => {
            return Err(QueryError::conversion(
                converter,
                format!("cannot convert a {} value", other.kind()),
            ))
        }
    };
    Ok(RawValue::Text(dt.format(format).to_string()))
}

static GENERALIZED_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})(\d{2})(\d{2})(\d{2})(\d{2})?(\d{2})?(?:[.,](\d{1,9}))?(Z|[+-]\d{2}(?:\d{2})?)?$",
    )
    .expect("GENERALIZED_TIME_RE is a valid regex pattern")
});

/// Parse a generalized time string into UTC.
///
/// A fraction is only honoured when seconds are present. A missing time zone is
/// read as UTC.
pub(crate) fn parse_generalized_time(s: &str) -> Option<DateTime<Utc>> {
    let caps = GENERALIZED_TIME_RE.captures(s.trim())?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let (month, day, hour) = (num(2)?, num(3)?, num(4)?);
    let minute = num(5).unwrap_or(0);
    let second = num(6).unwrap_or(0);

    let nanos = match caps.get(7) {
        Some(fraction) if caps.get(6).is_some() => {
            let digits = fraction.as_str();
            let padded = format!("{digits:0<9}");
            padded.parse::<u32>().ok()?
        }
        Some(_) => return None,
        None => 0,
    };

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_nano_opt(hour, minute, second, nanos)?;

    let offset_secs = match caps.get(8).map(|m| m.as_str()) {
        None | Some("Z") => 0,
        Some(tz) => {
            let sign = if tz.starts_with('-') { -1 } else { 1 };
            let hours: i32 = tz[1..3].parse().ok()?;
            let minutes: i32 = if tz.len() == 5 { tz[3..5].parse().ok()? } else { 0 };
            sign * (hours * 3600 + minutes * 60)
        }
    };

    let offset = FixedOffset::east_opt(offset_secs)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn require_text<'a>(converter: &str, value: &'a RawValue) -> QueryResult<&'a str> {
    value
        .as_text()
        .ok_or_else(|| QueryError::conversion(converter, "expected a text value"))
}
