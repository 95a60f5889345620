//! Table storage: backing streams, the table engine, the join operator, and
//! the referential-integrity scans over the table directory.

pub mod config;
pub mod integrity;
pub mod join;
pub mod remote;
pub mod stream;
pub mod table;

pub use config::StorageConfig;
pub use join::JoinedTable;
pub use stream::TableStream;
pub use table::{BaseTable, Table, UpdateMap};
