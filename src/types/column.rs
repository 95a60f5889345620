//! Cells and their typed views
//!
//! A cell is stored as raw text and interpreted on demand under its column's
//! declared type. Two reserved byte strings mark the non-value states: a
//! single 0x00 byte is SQL NULL, a single 0x7F byte marks a cell slot that
//! was never populated.

use super::data_type::ColumnType;
use super::metadata::ColumnMetadata;
use crate::error::{Error, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::cmp::Ordering;

/// Raw form of SQL NULL inside a cell string.
pub const NULL_SENTINEL: &str = "\u{0}";
/// Raw form of a never-populated cell, distinct from NULL.
pub const UNINIT_SENTINEL: &str = "\u{7f}";

/// The three states a cell can be in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellValue {
    Uninit,
    Null,
    Value(String),
}

impl CellValue {
    pub fn from_raw(raw: &str) -> CellValue {
        match raw {
            UNINIT_SENTINEL => CellValue::Uninit,
            NULL_SENTINEL => CellValue::Null,
            _ => CellValue::Value(raw.to_string()),
        }
    }

    /// The sentinel-encoded string form, as written to disk.
    pub fn as_raw(&self) -> &str {
        match self {
            CellValue::Uninit => UNINIT_SENTINEL,
            CellValue::Null => NULL_SENTINEL,
            CellValue::Value(s) => s,
        }
    }
}

/// One cell of a row: a value plus the metadata of its column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    value: CellValue,
    metadata: ColumnMetadata,
}

impl Column {
    pub fn new(raw: &str, metadata: ColumnMetadata) -> Column {
        Column {
            value: CellValue::from_raw(raw),
            metadata,
        }
    }

    pub fn metadata(&self) -> &ColumnMetadata {
        &self.metadata
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn raw_value(&self) -> &str {
        self.value.as_raw()
    }

    pub fn is_null(&self) -> bool {
        self.value == CellValue::Null
    }

    /// Total order used by ORDER BY, under the column's declared type.
    /// Cells that do not parse under the type (NULL, blank join padding)
    /// order before every parsable value and among themselves by raw text.
    pub fn cmp_ordered(&self, other: &Column) -> Ordering {
        match &self.metadata.column_type {
            ColumnType::Char(_) | ColumnType::Varchar(_) => {
                self.raw_value().cmp(other.raw_value())
            }
            ColumnType::Int | ColumnType::BigInt => {
                cmp_parsed(self, other, |v| v.parse::<i64>().ok())
            }
            ColumnType::Float | ColumnType::Double => {
                cmp_parsed(self, other, |v| v.parse::<f64>().ok())
            }
            ColumnType::Date => cmp_parsed(self, other, |v| parse_date(v).ok()),
            ColumnType::Time => cmp_parsed(self, other, |v| parse_time(v).ok()),
        }
    }
}

fn cmp_parsed<T: PartialOrd>(
    a: &Column,
    b: &Column,
    parse: impl Fn(&str) -> Option<T>,
) -> Ordering {
    match (parse(a.raw_value()), parse(b.raw_value())) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (None, None) => a.raw_value().cmp(b.raw_value()),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

/// Integer parse that must consume the entire string.
pub fn parse_int(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|_| Error::invalid(format!("Invalid integer value: {}", value)))
}

pub fn parse_float(value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| Error::invalid(format!("Invalid floating-point value: {}", value)))
}

/// ISO `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::invalid(format!("Invalid date value: {}", value)))
}

/// `HH:MM:SS`, attached to today's local date for comparison.
pub fn parse_time(value: &str) -> Result<NaiveDateTime> {
    let time = NaiveTime::parse_from_str(value, "%H:%M:%S")
        .map_err(|_| Error::invalid(format!("Invalid time value: {}", value)))?;
    Ok(Local::now().date_naive().and_time(time))
}
