use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::Scalar;

/// How a record value is printed inside a field cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    #[default]
    Text,
    /// ISO date or RFC 3339 timestamp printed as `March 5, 2024`.
    Date,
    YesNo,
}

const DATE_DISPLAY: &str = "%B %-d, %Y";

fn format_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format(DATE_DISPLAY).to_string());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive().format(DATE_DISPLAY).to_string())
}

/// Apply `format` to a record value. Missing values stay missing; values that
/// do not parse under `format` pass through untouched.
pub(crate) fn format_value(value: Option<&Scalar>, format: ValueFormat) -> Option<Scalar> {
    let value = value?;
    let formatted = match (format, value) {
        (ValueFormat::Text, v) => v.clone(),
        (ValueFormat::Date, Scalar::Text(s)) => format_date(s).map_or_else(|| value.clone(), Scalar::Text),
        (ValueFormat::Date, v) => v.clone(),
        (ValueFormat::YesNo, v) => Scalar::Bool(v.is_truthy()),
    };
    Some(formatted)
}
