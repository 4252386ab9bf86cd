use calamine::Data;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::utils::format_number;

/// Rendering of date/time cells, whatever the source format stored
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One spreadsheet cell, reduced to the three shapes the engine reasons about
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Trimmed textual rendering; blank cells render as ""
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    /// Numeric reading of the cell, if it has one.
    ///
    /// Text is accepted when it parses as a finite float ("120", " 12.5 ").
    /// "NaN" / "inf" spellings stay text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        if n.is_finite() {
            CellValue::Number(n)
        } else {
            CellValue::Text(n.to_string())
        }
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::from(s.as_str()),
            Data::Int(i) => CellValue::from(*i),
            Data::Float(f) => CellValue::from(*f),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(ts) => CellValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
                None => CellValue::from(dt.as_f64()),
            },
            // ODS stores ISO 8601 text
            Data::DateTimeIso(s) => match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                Ok(ts) => CellValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
                Err(_) => CellValue::from(s.as_str()),
            },
            Data::DurationIso(s) => CellValue::from(s.as_str()),
            Data::Error(e) => CellValue::Text(e.to_string()),
        }
    }
}
