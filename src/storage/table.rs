//! The table engine
//!
//! A table is a lazy row stream over a backing byte source, layered with a
//! restriction filter, a column projection, a distinct filter, and an
//! optional materializing order-by. Local tables also support insert,
//! update, and delete with schema, primary-key, not-null, and foreign-key
//! checks; updates and deletes rewrite the file through a temp-file swap so
//! a failed operation leaves the original untouched.

use super::config::StorageConfig;
use super::integrity;
use super::stream::{SharedStream, TableStream};
use crate::error::{Error, Result};
use crate::sql::Restriction;
use crate::strings;
use crate::types::column::{parse_date, parse_time};
use crate::types::{Column, ColumnMetadata, ColumnType, Row, Schema, NULL_SENTINEL};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use tracing::debug;

/// Column-name to new-value assignments for an UPDATE.
pub type UpdateMap = HashMap<String, String>;

/// The streaming-table contract shared by base tables and joined tables.
pub trait Table {
    fn schema(&self) -> &Schema;

    /// Pulls the next row surviving the restriction, projection, and
    /// distinct filters. `None` once the stream is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>>;

    fn insert_row(&mut self, row: Row) -> Result<()>;

    /// Updates every row passing the current restriction. Callers that only
    /// want specific rows must set a restriction first.
    fn update_rows(&mut self, updates: UpdateMap) -> Result<()>;

    /// Deletes every row passing the current restriction.
    fn delete_rows(&mut self) -> Result<()>;

    fn set_restrictions(&mut self, restrictions: &str) -> Result<()>;

    /// Sets the projection: a comma-joined column list, `*`, or empty for
    /// no filtering.
    fn filter_columns_by_name(&mut self, col_names: &str);

    fn filter_distinct(&mut self, distinct: bool);

    /// Materializes the remaining rows, sorts them by the comma-joined
    /// column list, and replaces the backing stream with the sorted buffer.
    fn order_by(&mut self, col_names: &str, descending: bool) -> Result<()>;

    /// Number of data rows; `u64::MAX` when unknown (remote tables).
    fn row_count(&self) -> u64;

    /// Rewinds the stream to the beginning and clears end-of-stream state.
    fn reset(&mut self) -> Result<()>;

    fn boxed_clone(&self) -> Box<dyn Table>;
}

/// A table backed by a local file, an in-memory sort buffer, or a remote
/// response body.
#[derive(Clone)]
pub struct BaseTable {
    config: StorageConfig,
    name: String,
    schema: Schema,
    stream: SharedStream,
    /// Whether the next pull must first consume the schema header line.
    skip_header: bool,
    restriction: Restriction,
    col_filter: Vec<String>,
    distinct: bool,
    seen: HashSet<String>,
    row_count: u64,
    is_remote: bool,
    exhausted: bool,
}

impl BaseTable {
    /// Opens a local table's backing file and counts its rows.
    pub fn open(config: StorageConfig, name: &str, schema: Schema) -> Result<BaseTable> {
        let stream = TableStream::open_file(&config.table_path(name))?.shared();
        let mut table = BaseTable {
            config,
            name: name.to_string(),
            schema,
            stream,
            skip_header: true,
            restriction: Restriction::default(),
            col_filter: Vec::new(),
            distinct: false,
            seen: HashSet::new(),
            row_count: 0,
            is_remote: false,
            exhausted: false,
        };
        table.count_rows()?;
        Ok(table)
    }

    /// Wraps the body of an HTTP response as a read-only table. The stream
    /// is already positioned at the first data row; the row count is
    /// unknown and reported as `u64::MAX`.
    pub fn from_remote(
        config: StorageConfig,
        stream: TableStream,
        url: &str,
        schema: Schema,
    ) -> BaseTable {
        let name = url.rsplit('/').next().unwrap_or(url).to_string();
        BaseTable {
            config,
            name,
            schema,
            stream: stream.shared(),
            skip_header: false,
            restriction: Restriction::default(),
            col_filter: Vec::new(),
            distinct: false,
            seen: HashSet::new(),
            row_count: u64::MAX,
            is_remote: true,
            exhausted: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn count_rows(&mut self) -> Result<()> {
        let mut stream = self.stream.borrow_mut();
        stream.read_line()?;
        while stream.read_line()?.is_some() {
            self.row_count += 1;
        }
        stream.rewind()?;
        Ok(())
    }

    /// Validation chain for one cell: data type, NOT NULL, primary-key
    /// uniqueness, reference validity.
    fn validate_column_value(
        &self,
        metadata: &ColumnMetadata,
        value: &str,
        index: usize,
    ) -> Result<()> {
        validate_data_type(&metadata.name, &metadata.column_type, value)?;
        if value == NULL_SENTINEL {
            if metadata.not_null {
                return Err(Error::invalid(format!("{} cannot be null", metadata.name)));
            }
            return Ok(());
        }
        if metadata.primary_key {
            self.check_for_duplicate_value(value, index)?;
        }
        integrity::validate_referenced_column(&self.config, metadata, value)
    }

    /// Scans the file for an existing equal value at the given column
    /// position. Used for primary-key uniqueness.
    fn check_for_duplicate_value(&self, value: &str, index: usize) -> Result<()> {
        let mut stream = TableStream::open_file(&self.config.table_path(&self.name))?;
        stream.read_line()?;
        while let Some(line) = stream.read_line()? {
            let cells = strings::scan_quoted_tokens(&line);
            if cells.get(index).map(String::as_str) == Some(value) {
                return Err(Error::invalid("Primary key must be unique"));
            }
        }
        Ok(())
    }

    fn write_updated_rows(&self, updates: &UpdateMap) -> Result<()> {
        let table_path = self.config.table_path(&self.name);
        let temp_path = self.config.temp_path(&self.name);
        let mut reader = TableStream::open_file(&table_path)?;
        reader.read_line()?;
        let mut out = fs::File::create(&temp_path)?;
        writeln!(out, "{}", self.schema.to_header())?;
        while let Some(line) = reader.read_line()? {
            let row = Row::from_line(self.schema.clone(), &line)?;
            if !self.restriction.apply(&row)? {
                writeln!(out, "{}", row.to_line())?;
                continue;
            }
            let mut cells = Vec::with_capacity(row.columns().len());
            for col in row.columns() {
                match updates.get(&col.metadata().name) {
                    Some(new_value) => {
                        // The old value must not be referenced elsewhere.
                        integrity::validate_referenced_by(
                            &self.config,
                            col.metadata(),
                            col.raw_value(),
                        )?;
                        cells.push(strings::quote(new_value));
                    }
                    None => cells.push(strings::quote(col.raw_value())),
                }
            }
            writeln!(out, "{}", cells.join(" "))?;
        }
        out.flush()?;
        drop(out);
        fs::rename(&temp_path, &table_path)?;
        Ok(())
    }

    fn write_undeleted_rows(&self) -> Result<u64> {
        let table_path = self.config.table_path(&self.name);
        let temp_path = self.config.temp_path(&self.name);
        let mut reader = TableStream::open_file(&table_path)?;
        reader.read_line()?;
        let mut out = fs::File::create(&temp_path)?;
        writeln!(out, "{}", self.schema.to_header())?;
        let mut deleted = 0;
        while let Some(line) = reader.read_line()? {
            let row = Row::from_line(self.schema.clone(), &line)?;
            if !self.restriction.apply(&row)? {
                writeln!(out, "{}", row.to_line())?;
            } else {
                for col in row.columns() {
                    integrity::validate_referenced_by(
                        &self.config,
                        col.metadata(),
                        col.raw_value(),
                    )?;
                }
                deleted += 1;
            }
        }
        out.flush()?;
        drop(out);
        fs::rename(&temp_path, &table_path)?;
        Ok(deleted)
    }
}

impl Table for BaseTable {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            // Pull the next row passing the restriction.
            let mut row = loop {
                if self.skip_header {
                    self.stream.borrow_mut().read_line()?;
                    self.skip_header = false;
                }
                let line = self.stream.borrow_mut().read_line()?;
                let Some(line) = line else {
                    self.exhausted = true;
                    return Ok(None);
                };
                let row = Row::from_line(self.schema.clone(), &line)?;
                if self.restriction.apply(&row)? {
                    break row;
                }
            };
            row.order_and_filter_columns(&self.col_filter)?;
            if self.distinct && !self.seen.insert(fingerprint(&row)) {
                continue;
            }
            return Ok(Some(row));
        }
    }

    fn insert_row(&mut self, mut row: Row) -> Result<()> {
        if self.is_remote {
            return Err(Error::invalid("Cannot insert into a remote table"));
        }
        for index in 0..row.columns().len() {
            let metadata = row.columns()[index].metadata().clone();
            let value = row.columns()[index].raw_value().to_string();
            self.validate_column_value(&metadata, &value, index)?;
            let formatted = format_column_value(&metadata.column_type, &value)?;
            row.set(index, Column::new(&formatted, metadata));
        }
        let mut file = OpenOptions::new()
            .append(true)
            .open(self.config.table_path(&self.name))?;
        writeln!(file, "{}", row.to_line())?;
        self.row_count += 1;
        debug!(table = %self.name, rows = self.row_count, "inserted row");
        Ok(())
    }

    fn update_rows(&mut self, updates: UpdateMap) -> Result<()> {
        if self.is_remote {
            return Err(Error::invalid("Cannot update a remote table"));
        }
        let mut formatted = UpdateMap::new();
        for (column, value) in updates {
            let index = self
                .schema
                .column_index(&column)
                .ok_or_else(|| Error::invalid(format!("Column {} does not exist", column)))?;
            let metadata = self.schema.columns()[index].clone();
            // An unrestricted update would write the same key into every row.
            if metadata.primary_key && self.restriction.is_empty() {
                return Err(Error::invalid("Primary key must be unique"));
            }
            self.validate_column_value(&metadata, &value, index)?;
            formatted.insert(column, format_column_value(&metadata.column_type, &value)?);
        }
        let result = self.write_updated_rows(&formatted);
        if result.is_err() {
            let _ = fs::remove_file(self.config.temp_path(&self.name));
        } else {
            debug!(table = %self.name, "updated rows");
        }
        result
    }

    fn delete_rows(&mut self) -> Result<()> {
        if self.is_remote {
            return Err(Error::invalid("Cannot delete from a remote table"));
        }
        match self.write_undeleted_rows() {
            Ok(deleted) => {
                self.row_count -= deleted;
                debug!(table = %self.name, deleted, "deleted rows");
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(self.config.temp_path(&self.name));
                Err(e)
            }
        }
    }

    fn set_restrictions(&mut self, restrictions: &str) -> Result<()> {
        self.restriction = Restriction::new(restrictions)?;
        Ok(())
    }

    fn filter_columns_by_name(&mut self, col_names: &str) {
        if col_names.is_empty() {
            self.col_filter.clear();
        } else if col_names != "*" {
            self.col_filter = strings::split(col_names, ',', false);
        }
    }

    fn filter_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    fn order_by(&mut self, col_names: &str, descending: bool) -> Result<()> {
        if col_names.is_empty() {
            return Ok(());
        }
        let names = strings::split(col_names, ',', false);
        for name in &names {
            if !self.schema.has_column(name) {
                return Err(Error::invalid(format!("Column {} does not exist", name)));
            }
        }
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        rows.sort_by(|a, b| compare_rows(a, b, &names, descending));
        let mut buffer = self.schema.to_header();
        buffer.push('\n');
        for (index, row) in rows.iter().enumerate() {
            buffer.push_str(&row.to_line());
            if index != rows.len() - 1 {
                buffer.push('\n');
            }
        }
        self.stream = TableStream::from_buffer(buffer).shared();
        self.skip_header = true;
        self.exhausted = false;
        Ok(())
    }

    fn row_count(&self) -> u64 {
        self.row_count
    }

    fn reset(&mut self) -> Result<()> {
        self.stream.borrow_mut().rewind()?;
        self.skip_header = !self.is_remote;
        self.exhausted = false;
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn Table> {
        Box::new(self.clone())
    }
}

/// Canonical fingerprint of a row's projected cells, used by DISTINCT.
pub(crate) fn fingerprint(row: &Row) -> String {
    let mut out = String::new();
    for col in row.columns() {
        out.push_str(&col.metadata().name);
        out.push('=');
        out.push_str(col.raw_value());
        out.push(';');
    }
    out
}

/// Lexicographic comparison across the listed columns, each under its
/// declared type. Reversed when descending.
pub(crate) fn compare_rows(
    row1: &Row,
    row2: &Row,
    names: &[String],
    descending: bool,
) -> Ordering {
    for name in names {
        let (col1, col2) = match (row1.get_column(name), row2.get_column(name)) {
            (Ok(a), Ok(b)) => (a, b),
            _ => continue,
        };
        let ordering = col1.cmp_ordered(col2);
        if ordering == Ordering::Equal {
            continue;
        }
        return if descending {
            ordering.reverse()
        } else {
            ordering
        };
    }
    Ordering::Equal
}

/// Data-type validation for one raw cell value. NULL passes every type;
/// character values must arrive quoted.
fn validate_data_type(col_name: &str, column_type: &ColumnType, value: &str) -> Result<()> {
    if value == NULL_SENTINEL {
        return Ok(());
    }
    let ok = match column_type {
        ColumnType::Int => value.parse::<i32>().is_ok(),
        ColumnType::BigInt => value.parse::<i64>().is_ok(),
        ColumnType::Float => value.parse::<f32>().is_ok(),
        ColumnType::Double => value.parse::<f64>().is_ok(),
        ColumnType::Date => parse_date(value).is_ok(),
        ColumnType::Time => parse_time(value).is_ok(),
        ColumnType::Char(_) | ColumnType::Varchar(_) => strings::extract_quoted(value) != value,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "Invalid data type: expected {} for column {}",
            column_type, col_name
        )))
    }
}

/// Canonical on-disk form of a validated cell: dates and times re-emitted
/// in ISO form, char values unquoted and space-padded to their width,
/// varchar values unquoted and truncated. NULL is stored as-is.
fn format_column_value(column_type: &ColumnType, value: &str) -> Result<String> {
    if value == NULL_SENTINEL {
        return Ok(value.to_string());
    }
    match column_type {
        ColumnType::Date => Ok(parse_date(value)?.format("%Y-%m-%d").to_string()),
        ColumnType::Time => Ok(parse_time(value)?.format("%H:%M:%S").to_string()),
        ColumnType::Char(limit) | ColumnType::Varchar(limit) => {
            let mut out = strings::unescape(strings::extract_quoted(value))?;
            while out.len() > *limit {
                out.pop();
            }
            if out.len() < *limit && matches!(column_type, ColumnType::Char(_)) {
                let padding = *limit - out.len();
                out.extend(std::iter::repeat(' ').take(padding));
            }
            Ok(out)
        }
        _ => Ok(value.to_string()),
    }
}
