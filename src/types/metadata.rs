//! Per-column metadata and its on-disk record form

use super::data_type::ColumnType;
use crate::error::{Error, Result};
use crate::strings;

/// Immutable description of one column: its name, owning table, declared
/// type, optional reference target, and constraint flags. Primary key
/// implies not-null.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    pub table: String,
    pub column_type: ColumnType,
    /// Reference target, either `table.column` or a bare column of the
    /// owning table.
    pub references: Option<String>,
    pub primary_key: bool,
    pub not_null: bool,
}

impl ColumnMetadata {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        column_type: ColumnType,
        references: Option<String>,
        primary_key: bool,
        not_null: bool,
    ) -> Self {
        ColumnMetadata {
            name: name.into(),
            table: table.into(),
            column_type,
            references,
            // A primary key can never hold NULL.
            not_null: not_null || primary_key,
            primary_key,
        }
    }

    /// Serializes to the five-token header record:
    /// `"name" "type" "references" <primary> <notNull>`.
    pub fn to_record(&self) -> String {
        format!(
            "{} {} {} {} {}",
            strings::quote(&self.name),
            strings::quote(&self.column_type.to_string()),
            strings::quote(self.references.as_deref().unwrap_or("")),
            self.primary_key,
            self.not_null
        )
    }

    /// Parses a five-token header record. The owning table name is not part
    /// of the record and is filled in by the schema.
    pub fn from_record(record: &str, table: &str) -> Result<ColumnMetadata> {
        let tokens = strings::scan_quoted_tokens(record);
        if tokens.len() != 5 {
            return Err(Error::invalid(format!(
                "Malformed column metadata: {}",
                record
            )));
        }
        let parse_bool = |s: &str| -> Result<bool> {
            match s {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(Error::invalid(format!(
                    "Malformed column metadata flag: {}",
                    other
                ))),
            }
        };
        let references = if tokens[2].is_empty() {
            None
        } else {
            Some(tokens[2].clone())
        };
        Ok(ColumnMetadata {
            name: tokens[0].clone(),
            table: table.to_string(),
            column_type: ColumnType::parse(&tokens[1])?,
            references,
            primary_key: parse_bool(&tokens[3])?,
            not_null: parse_bool(&tokens[4])?,
        })
    }

    /// The `table.column` form other columns use to reference this one.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }
}
