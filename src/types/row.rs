//! Rows: ordered cell sequences bound to a schema

use super::column::Column;
use super::schema::{split_qualified, Schema};
use crate::error::{Error, Result};
use crate::strings;

/// An ordered sequence of cells. A row deserialized from a table line has
/// one cell per schema column; a joined row carries the cells of both parent
/// schemas concatenated.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Schema,
    columns: Vec<Column>,
}

impl Row {
    /// An empty row bound to a schema, ready for streaming deserialization.
    pub fn new(schema: Schema) -> Row {
        Row {
            schema,
            columns: Vec::new(),
        }
    }

    /// Builds a row from raw values in schema order, resolving backslash
    /// escapes in each value. Used by INSERT.
    pub fn from_values(schema: Schema, values: &[String]) -> Result<Row> {
        let mut columns = Vec::new();
        for (metadata, value) in schema.columns().iter().zip(values) {
            columns.push(Column::new(&strings::unescape(value)?, metadata.clone()));
        }
        Ok(Row { schema, columns })
    }

    /// Deserializes one table line: whitespace-separated double-quoted cells.
    pub fn from_line(schema: Schema, line: &str) -> Result<Row> {
        let cells = strings::scan_quoted_tokens(line);
        if cells.len() > schema.len() {
            return Err(Error::invalid(format!("Malformed table row: {}", line)));
        }
        let columns = cells
            .iter()
            .zip(schema.columns())
            .map(|(cell, metadata)| Column::new(cell, metadata.clone()))
            .collect();
        Ok(Row { schema, columns })
    }

    /// Serializes to the on-disk line form, each cell double-quoted.
    pub fn to_line(&self) -> String {
        self.columns
            .iter()
            .map(|c| strings::quote(c.raw_value()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn set(&mut self, index: usize, column: Column) {
        self.columns[index] = column;
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Looks up a cell by column name, which may be qualified as
    /// `table.column` (either part optionally quoted). An unqualified name
    /// matching more than one cell is ambiguous.
    pub fn get_column(&self, name: &str) -> Result<&Column> {
        let (table, column) = split_qualified(name);
        // Quotes are stripped only around the parts of a qualified name; a
        // bare quoted token is a string literal, not a column.
        let (table, column) = match table {
            Some(t) => (
                Some(strings::extract_quoted(&t).to_string()),
                strings::extract_quoted(&column).to_string(),
            ),
            None => (None, column),
        };
        let mut found: Option<&Column> = None;
        for col in &self.columns {
            if col.metadata().name != column {
                continue;
            }
            match &table {
                None => {
                    if found.is_some() {
                        return Err(Error::invalid(format!("Ambiguous column: {}", column)));
                    }
                    found = Some(col);
                }
                Some(t) => {
                    if &col.metadata().table == t {
                        found = Some(col);
                    }
                }
            }
        }
        found.ok_or_else(|| Error::invalid(format!("Column {} does not exist", name)))
    }

    /// Projects the row onto the named columns, in the listed order. An
    /// empty list leaves the row untouched.
    pub fn order_and_filter_columns(&mut self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let mut projected = Vec::with_capacity(names.len());
        for name in names {
            projected.push(self.get_column(name)?.clone());
        }
        self.columns = projected;
        Ok(())
    }

    /// Appends the other row's cells, as the join operator does.
    pub fn merge(&mut self, other: &Row) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::invalid("Row not initialized"));
        }
        self.columns.extend(other.columns.iter().cloned());
        Ok(())
    }

    /// Replaces the cells with one blank cell per schema column. Used to pad
    /// unmatched probe rows in a left outer join.
    pub fn fill_blank(&mut self) {
        self.columns = self
            .schema
            .columns()
            .iter()
            .map(|m| Column::new("", m.clone()))
            .collect();
    }
}
