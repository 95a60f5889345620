//! Referential-integrity scans
//!
//! Two directions: a value being written must exist in the column it
//! references, and a value being removed or replaced must not still be named
//! by a referencing column in any other table.

use super::config::StorageConfig;
use super::stream::TableStream;
use crate::error::{Error, Result};
use crate::types::{ColumnMetadata, Row, Schema};

/// Checks that `value`, about to be stored under `metadata`, exists as a
/// non-null cell of the referenced column. A bare reference target resolves
/// to the declaring table.
pub fn validate_referenced_column(
    config: &StorageConfig,
    metadata: &ColumnMetadata,
    value: &str,
) -> Result<()> {
    let Some(reference) = &metadata.references else {
        return Ok(());
    };
    let (table, column) = match reference.split_once('.') {
        Some((table, column)) => (table.to_string(), column.to_string()),
        None => (metadata.table.clone(), reference.clone()),
    };
    let mut stream = TableStream::open_file(&config.table_path(&table))?;
    let header = stream.read_line()?.unwrap_or_default();
    let schema = Schema::from_header(&table, &header)?;
    while let Some(line) = stream.read_line()? {
        let row = Row::from_line(schema.clone(), &line)?;
        let cell = row.get_column(&column)?;
        if !cell.is_null() && cell.raw_value() == value {
            return Ok(());
        }
    }
    Err(Error::invalid(format!(
        "Value {} does not reference {}",
        value, reference
    )))
}

/// Checks that no column of any other table still references `old_value` of
/// the column described by `metadata`. Scans every `.table` file in the data
/// directory except the owning table's own file.
pub fn validate_referenced_by(
    config: &StorageConfig,
    metadata: &ColumnMetadata,
    old_value: &str,
) -> Result<()> {
    let target = metadata.qualified_name();
    for entry in std::fs::read_dir(&config.data_dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension() != Some(std::ffi::OsStr::new("table")) {
            continue;
        }
        let table_name = match path.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => continue,
        };
        if table_name == metadata.table {
            continue;
        }
        let mut stream = TableStream::open_file(&path)?;
        let header = stream.read_line()?.unwrap_or_default();
        let schema = Schema::from_header(&table_name, &header)?;
        for other in schema.columns() {
            if other.references.as_deref() != Some(target.as_str()) {
                continue;
            }
            while let Some(line) = stream.read_line()? {
                let row = Row::from_line(schema.clone(), &line)?;
                let cell = row.get_column(&other.name)?;
                if !cell.is_null() && cell.raw_value() == old_value {
                    return Err(Error::invalid(format!(
                        "Column {}.{} references a value being modified or deleted",
                        other.table, other.name
                    )));
                }
            }
            break;
        }
    }
    Ok(())
}
