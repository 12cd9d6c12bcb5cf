use crate::error::{KpiError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let year = if date.month() == 12 {
        date.year() + 1
    } else {
        date.year()
    };

    let month = if date.month() == 12 {
        1
    } else {
        date.month() + 1
    };

    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

pub fn prev_month_start(date: NaiveDate) -> NaiveDate {
    let year = if date.month() == 1 {
        date.year() - 1
    } else {
        date.year()
    };

    let month = if date.month() == 1 {
        12
    } else {
        date.month() - 1
    };

    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Unix timestamp (seconds) of midnight UTC on the first day of the month
/// containing `date`. Used as the chronological sort key of monthly points.
pub fn month_sort_key(date: NaiveDate) -> i64 {
    month_start(date)
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp()
}

/// Whole days from `start` to `end`, clamped at zero when `end` precedes `start`.
pub fn non_negative_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().max(0)
}

/// `numerator / denominator`, or 0 when the denominator is zero or the
/// result is not finite.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

pub fn percentage(part: f64, whole: f64) -> f64 {
    safe_ratio(part, whole) * 100.0
}

pub fn validate_label_format(format: &str) -> Result<()> {
    if format.trim().is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(KpiError::InvalidLabelFormat(format.to_string()));
    }
    Ok(())
}

/// Parses a loosely formatted monetary string.
///
/// Currency symbols and whitespace are ignored. Both `1,234.50` and
/// `1.234,50` are understood; a lone comma followed by anything other than
/// exactly three digits is read as a decimal comma, and repeated dots
/// (`1.250.000`) are thousands separators. Blank input is absent
/// (`None`); anything else that cannot be read is `Some(0.0)`.
pub fn parse_lenient_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(comma)) => {
            let single_comma = cleaned.matches(',').count() == 1;
            let digits_after = cleaned.len() - comma - 1;
            if single_comma && digits_after != 3 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (Some(_), None) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    let value = normalized.parse::<f64>().unwrap_or(0.0);
    Some(if value.is_finite() { value } else { 0.0 })
}

/// Parses a date from the handful of shapes the record stores produce:
/// `YYYY-MM-DD`, RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.fff]`
/// and `DD/MM/YYYY`.
pub fn parse_lenient_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(timestamp.date());
        }
    }

    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    None
}

pub fn coerce_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(number) => Some(number.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0)),
        Value::String(text) => parse_lenient_amount(text),
        _ => Some(0.0),
    }
}

pub fn coerce_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(text) => parse_lenient_date(text),
        _ => None,
    }
}

pub fn coerce_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub fn deserialize_lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_amount))
}

pub fn deserialize_lenient_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_date))
}

pub fn deserialize_lenient_text<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_text))
}
