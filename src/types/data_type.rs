//! Declared column types

use crate::error::{Error, Result};
use std::fmt;

/// The declared type of a column. `Char` and `Varchar` carry their width.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int,
    BigInt,
    Float,
    Double,
    Date,
    Time,
    Char(usize),
    Varchar(usize),
}

impl ColumnType {
    /// Parses the lowercase textual form used in queries and table headers:
    /// `int`, `bigint`, `float`, `double`, `date`, `time`, `char(N)`,
    /// `varchar(N)`.
    pub fn parse(s: &str) -> Result<ColumnType> {
        match s {
            "int" => return Ok(ColumnType::Int),
            "bigint" => return Ok(ColumnType::BigInt),
            "float" => return Ok(ColumnType::Float),
            "double" => return Ok(ColumnType::Double),
            "date" => return Ok(ColumnType::Date),
            "time" => return Ok(ColumnType::Time),
            _ => {}
        }
        let sized = |inner: &str| -> Option<usize> {
            if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                inner.parse().ok()
            } else {
                None
            }
        };
        if let Some(inner) = s.strip_prefix("char(").and_then(|r| r.strip_suffix(')')) {
            if let Some(size) = sized(inner) {
                return Ok(ColumnType::Char(size));
            }
        }
        if let Some(inner) = s.strip_prefix("varchar(").and_then(|r| r.strip_suffix(')')) {
            if let Some(size) = sized(inner) {
                return Ok(ColumnType::Varchar(size));
            }
        }
        Err(Error::invalid(format!("Invalid data type {}", s)))
    }

    /// True for `char(N)` and `varchar(N)`.
    pub fn is_char(&self) -> bool {
        matches!(self, ColumnType::Char(_) | ColumnType::Varchar(_))
    }

    /// Whether two declared types may be compared: any character type pairs
    /// with any character type, every other type only with itself.
    pub fn compatible_with(&self, other: &ColumnType) -> bool {
        if self.is_char() {
            other.is_char()
        } else {
            self == other
        }
    }

    /// Column width used by the fixed-width result printer.
    pub fn display_width(&self) -> usize {
        match self {
            ColumnType::Int => 11,     // -2147483648
            ColumnType::BigInt => 20,  // -9223372036854775808
            ColumnType::Float => 15,
            ColumnType::Double => 15,
            ColumnType::Date => 10, // YYYY-MM-DD
            ColumnType::Time => 8,  // hh:mm:ss
            ColumnType::Char(n) | ColumnType::Varchar(n) => *n,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => write!(f, "int"),
            ColumnType::BigInt => write!(f, "bigint"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Double => write!(f, "double"),
            ColumnType::Date => write!(f, "date"),
            ColumnType::Time => write!(f, "time"),
            ColumnType::Char(n) => write!(f, "char({})", n),
            ColumnType::Varchar(n) => write!(f, "varchar({})", n),
        }
    }
}
