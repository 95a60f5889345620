//! Query execution
//!
//! The executor dispatches a parsed query to the storage layer: DDL
//! statements manage table files (with referential-integrity checks at
//! create and drop), DML statements open the table and delegate, and SELECT
//! composes a streaming table pipeline — joins first, then restriction,
//! order-by, distinct, and projection — returned to the caller to pull.

use crate::error::{Error, Result};
use crate::sql::Query;
use crate::storage::{integrity, remote, BaseTable, JoinedTable, StorageConfig, Table, TableStream, UpdateMap};
use crate::types::{Row, Schema};
use std::fs;
use tracing::debug;

pub struct Executor {
    config: StorageConfig,
}

impl Executor {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Runs one query. DDL and DML return no stream; SELECT returns the
    /// composed table for the caller to iterate.
    pub fn execute(&self, query: Query) -> Result<Option<Box<dyn Table>>> {
        match query {
            Query::Create { table_name, schema } => {
                self.execute_create(&table_name, schema)?;
                Ok(None)
            }
            Query::Drop { table_name } => {
                self.execute_drop(&table_name)?;
                Ok(None)
            }
            Query::Insert {
                table_name,
                column_names,
                column_values,
            } => {
                self.execute_insert(&table_name, &column_names, &column_values)?;
                Ok(None)
            }
            Query::Update {
                table_name,
                columns,
                values,
                restrictions,
            } => {
                self.execute_update(&table_name, &columns, &values, &restrictions)?;
                Ok(None)
            }
            Query::Delete {
                table_name,
                restrictions,
            } => {
                self.execute_delete(&table_name, &restrictions)?;
                Ok(None)
            }
            Query::Select {
                distinct,
                column_names,
                table_names,
                restrictions,
                join_conditions,
                order_by,
                descending,
            } => {
                let table = self.execute_select(
                    &table_names,
                    &restrictions,
                    &join_conditions,
                    &order_by,
                    descending,
                    distinct,
                    &column_names,
                )?;
                Ok(Some(table))
            }
        }
    }

    fn execute_create(&self, table_name: &str, schema: Schema) -> Result<()> {
        self.check_referenced_columns(&schema)?;
        let path = self.config.table_path(table_name);
        if path.exists() {
            return Err(Error::invalid(format!("{} already exists", table_name)));
        }
        fs::create_dir_all(&self.config.data_dir)?;
        fs::write(&path, format!("{}\n", schema.to_header()))?;
        debug!(table = table_name, "created table");
        Ok(())
    }

    /// Every `REFERENCES` target must name an existing column of the same
    /// type, in this schema or in an existing table's header.
    fn check_referenced_columns(&self, schema: &Schema) -> Result<()> {
        for metadata in schema.columns() {
            let Some(reference) = &metadata.references else {
                continue;
            };
            match reference.split_once('.') {
                None => {
                    if !schema.has_column(reference) {
                        return Err(Error::invalid(format!(
                            "Column {} does not exist",
                            reference
                        )));
                    }
                    if schema.column_metadata(reference)?.column_type != metadata.column_type {
                        return Err(Error::invalid(format!(
                            "Column {} does not have data type {}",
                            reference, metadata.column_type
                        )));
                    }
                }
                Some((table, column)) => {
                    let path = self.config.table_path(table);
                    if !path.exists() {
                        return Err(Error::invalid(format!("Table {} not found", table)));
                    }
                    let target = self.read_schema(table)?;
                    if !target.has_column(column) {
                        return Err(Error::invalid(format!(
                            "Column {} not found in table {}",
                            column, table
                        )));
                    }
                    if target.column_metadata(column)?.column_type != metadata.column_type {
                        return Err(Error::invalid(format!(
                            "Column {} in table {} does not have data type {}",
                            column, table, metadata.column_type
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn execute_drop(&self, table_name: &str) -> Result<()> {
        let path = self.config.table_path(table_name);
        if !path.exists() {
            return Err(Error::invalid(format!("{} does not exist", table_name)));
        }
        // Refuse while any cell is still referenced from another table.
        let schema = self.read_schema(table_name)?;
        let mut stream = TableStream::open_file(&path)?;
        stream.read_line()?;
        while let Some(line) = stream.read_line()? {
            let row = Row::from_line(schema.clone(), &line)?;
            for col in row.columns() {
                integrity::validate_referenced_by(&self.config, col.metadata(), col.raw_value())?;
            }
        }
        fs::remove_file(&path)?;
        debug!(table = table_name, "dropped table");
        Ok(())
    }

    fn execute_insert(
        &self,
        table_name: &str,
        column_names: &[String],
        column_values: &[String],
    ) -> Result<()> {
        if !self.config.table_path(table_name).exists() {
            return Err(Error::invalid(format!("{} does not exist", table_name)));
        }
        let schema = self.read_schema(table_name)?;
        if column_names.len() != column_values.len() {
            return Err(Error::invalid("Number of columns and values must match"));
        }
        for name in column_names {
            if !schema.has_column(name) {
                return Err(Error::invalid(format!("Unknown column: {}", name)));
            }
        }
        // Reorder the values into schema order; every column must be named.
        let mut ordered = Vec::with_capacity(schema.len());
        for metadata in schema.columns() {
            match column_names.iter().position(|n| n == &metadata.name) {
                Some(position) => ordered.push(column_values[position].clone()),
                None => {
                    return Err(Error::invalid(format!(
                        "Column not specified: {}",
                        metadata.name
                    )))
                }
            }
        }
        let row = Row::from_values(schema.clone(), &ordered)?;
        let mut table = BaseTable::open(self.config.clone(), table_name, schema)?;
        table.insert_row(row)
    }

    fn execute_update(
        &self,
        table_name: &str,
        columns: &[String],
        values: &[String],
        restrictions: &str,
    ) -> Result<()> {
        if !self.config.table_path(table_name).exists() {
            return Err(Error::invalid(format!("{} does not exist", table_name)));
        }
        let schema = self.read_schema(table_name)?;
        let mut updates = UpdateMap::new();
        for (column, value) in columns.iter().zip(values) {
            updates.insert(column.clone(), value.clone());
        }
        let mut table = BaseTable::open(self.config.clone(), table_name, schema)?;
        if !restrictions.is_empty() {
            table.set_restrictions(restrictions)?;
        }
        table.update_rows(updates)
    }

    fn execute_delete(&self, table_name: &str, restrictions: &str) -> Result<()> {
        if !self.config.table_path(table_name).exists() {
            return Err(Error::invalid(format!("{} does not exist", table_name)));
        }
        let schema = self.read_schema(table_name)?;
        let mut table = BaseTable::open(self.config.clone(), table_name, schema)?;
        if !restrictions.is_empty() {
            table.set_restrictions(restrictions)?;
        }
        table.delete_rows()
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_select(
        &self,
        table_names: &[String],
        restrictions: &str,
        join_conditions: &str,
        order_by: &str,
        descending: bool,
        distinct: bool,
        column_names: &str,
    ) -> Result<Box<dyn Table>> {
        let mut table: Option<Box<dyn Table>> = None;
        for name in table_names {
            let next: Box<dyn Table> = if name.starts_with("http://") {
                let (stream, schema) = remote::fetch(name)?;
                Box::new(BaseTable::from_remote(
                    self.config.clone(),
                    stream,
                    name,
                    schema,
                ))
            } else {
                let path = self.config.table_path(name);
                if !path.exists() {
                    return Err(Error::invalid(format!("{} does not exist", name)));
                }
                let schema = self.read_schema(name)?;
                Box::new(BaseTable::open(self.config.clone(), name, schema)?)
            };
            table = Some(match table {
                None => next,
                Some(current) => Box::new(JoinedTable::new(current, next, join_conditions)?),
            });
        }
        let mut table = table.ok_or_else(|| Error::invalid("Malformed query"))?;
        if !restrictions.is_empty() {
            table.set_restrictions(restrictions)?;
        }
        table.order_by(order_by, descending)?;
        table.filter_distinct(distinct);
        table.filter_columns_by_name(column_names);
        Ok(table)
    }

    /// Reads a table's schema from its header line.
    fn read_schema(&self, table_name: &str) -> Result<Schema> {
        let mut stream = TableStream::open_file(&self.config.table_path(table_name))?;
        let header = stream.read_line()?.unwrap_or_default();
        Schema::from_header(table_name, &header)
    }
}
