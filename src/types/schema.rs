//! Table schemas: an ordered sequence of column metadata with a
//! tab-delimited single-line header form.

use super::metadata::ColumnMetadata;
use crate::error::{Error, Result};
use crate::strings;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    columns: Vec<ColumnMetadata>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnMetadata>) -> Self {
        Schema { columns }
    }

    /// Reconstructs a schema from a table file's header line. The table name
    /// stored in each column comes from `table_name`, not the header; for a
    /// URL-sourced table the name is the path segment after the last `/`.
    pub fn from_header(table_name: &str, header: &str) -> Result<Schema> {
        let table = if let Some(rest) = table_name.strip_prefix("http://") {
            rest.rsplit('/').next().unwrap_or(rest)
        } else {
            table_name
        };
        let mut columns = Vec::new();
        for record in strings::split(header, '\t', false) {
            columns.push(ColumnMetadata::from_record(&record, table)?);
        }
        Ok(Schema { columns })
    }

    /// Serializes to the single tab-delimited header line.
    pub fn to_header(&self) -> String {
        self.columns
            .iter()
            .map(ColumnMetadata::to_record)
            .collect::<Vec<_>>()
            .join("\t")
    }

    pub fn add_column(&mut self, metadata: ColumnMetadata) {
        self.columns.push(metadata);
    }

    /// Appends the other schema's columns, as a join does.
    pub fn merge(&mut self, other: &Schema) {
        self.columns.extend(other.columns.iter().cloned());
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether a column exists. `name` may be qualified as `table.column`.
    pub fn has_column(&self, name: &str) -> bool {
        let (table, column) = split_qualified(name);
        let table = table.as_deref();
        self.columns
            .iter()
            .any(|m| m.name == column && table.map_or(true, |t| m.table == t))
    }

    /// Position of a column by bare name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|m| m.name == name)
    }

    /// Metadata of a column by bare name.
    pub fn column_metadata(&self, name: &str) -> Result<&ColumnMetadata> {
        self.columns
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| Error::invalid(format!("Column {} does not exist", name)))
    }
}

/// Splits an optionally qualified column name into `(table, column)` parts.
pub(crate) fn split_qualified(name: &str) -> (Option<String>, String) {
    if name.contains('.') {
        let parts = strings::split(name, '.', true);
        if parts.len() >= 2 {
            return (Some(parts[0].clone()), parts[1].clone());
        }
    }
    (None, name.to_string())
}
