//! A single-process SQL engine over plain text table files
//!
//! Each table lives in one file under a configurable directory: a schema
//! header line followed by one quoted-cell line per row. Queries are parsed
//! into a [`sql::Query`], executed by the [`execution::Executor`], and
//! SELECT results come back as a lazy [`storage::Table`] stream layering
//! join, restriction, projection, distinct, and order-by operators.
//!
//! Supported statements: CREATE TABLE, DROP TABLE, INSERT, UPDATE, DELETE,
//! and SELECT (with WHERE, DISTINCT, ORDER BY, and multi-table hash joins).
//! There are no transactions, indexes, or aggregate functions.

pub mod error;
pub mod execution;
pub mod sql;
pub mod storage;
pub mod strings;
pub mod types;

pub use error::{Error, Result};
pub use execution::Executor;
pub use sql::{Query, Restriction};
pub use storage::{BaseTable, JoinedTable, StorageConfig, Table};
pub use types::{Column, ColumnMetadata, ColumnType, Row, Schema};
