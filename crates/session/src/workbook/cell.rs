use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use stocktake_core::{finite_or, parse_numeric};

/// A single spreadsheet cell as handed over by the codec.
///
/// Untagged so JSON hosts can pass plain `null`, numbers, booleans and
/// strings; RFC 3339 strings decode as datetimes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    DateTime(DateTime<Utc>),
    Text(String),
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<Option<DateTime<Utc>>> for CellValue {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(CellValue::Empty, CellValue::DateTime)
    }
}

/// Day zero of spreadsheet serial dates.
fn serial_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Largest serial a spreadsheet can represent (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed display text; empty for blank cells.
    pub fn text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::DateTime(t) => t.to_rfc3339(),
            CellValue::Text(s) => s.trim().to_string(),
        }
    }

    /// Numeric reading with `fallback` for blank or unparsable cells.
    pub fn number(&self, fallback: f64) -> f64 {
        match self {
            CellValue::Number(n) => finite_or(*n, fallback),
            CellValue::Text(s) => parse_numeric(s, fallback),
            _ => fallback,
        }
    }

    /// Datetime reading: native datetimes, serial dates and common text
    /// forms. Anything else is `None`.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::DateTime(t) => Some(*t),
            CellValue::Number(serial) => from_serial(*serial),
            CellValue::Text(s) => parse_date_text(s.trim()),
            _ => None,
        }
    }
}

fn from_serial(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || serial <= 0.0 || serial > MAX_SERIAL {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    let naive = serial_epoch()?.checked_add_signed(Duration::milliseconds(millis))?;
    Some(Utc.from_utc_datetime(&naive))
}

fn parse_date_text(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
        }
    }
    None
}

/// A data row keyed by trimmed, lower-cased header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<String, CellValue>,
}

impl RawRow {
    pub fn from_cells(headers: &[String], cells: &[CellValue]) -> Self {
        let cells = headers
            .iter()
            .zip(cells.iter().cloned().chain(std::iter::repeat(CellValue::Empty)))
            .map(|(header, cell)| (header.trim().to_lowercase(), cell))
            .collect();
        Self { cells }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, CellValue)>) -> Self {
        Self {
            cells: pairs
                .into_iter()
                .map(|(h, c)| (h.trim().to_lowercase(), c))
                .collect(),
        }
    }

    /// The cell under `header`, `None` when absent or blank.
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells
            .get(&header.to_lowercase())
            .filter(|cell| !cell.is_empty())
    }

    pub fn text(&self, header: &str) -> String {
        self.get(header).map(CellValue::text).unwrap_or_default()
    }

    pub fn number(&self, header: &str, fallback: f64) -> f64 {
        self.get(header).map_or(fallback, |c| c.number(fallback))
    }

    /// Like [`RawRow::number`] but distinguishes a missing cell.
    pub fn number_opt(&self, header: &str) -> Option<f64> {
        let cell = self.get(header)?;
        let value = cell.number(f64::NAN);
        value.is_finite().then_some(value)
    }

    pub fn datetime(&self, header: &str) -> Option<DateTime<Utc>> {
        self.get(header).and_then(CellValue::datetime)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_empty)
    }
}
