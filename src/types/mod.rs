//! The data model: declared types, column metadata, schemas, cells, rows.

pub mod column;
pub mod data_type;
pub mod metadata;
pub mod row;
pub mod schema;

pub use column::{CellValue, Column, NULL_SENTINEL, UNINIT_SENTINEL};
pub use data_type::ColumnType;
pub use metadata::ColumnMetadata;
pub use row::Row;
pub use schema::Schema;
