//! Common test utilities for the integration suite
#![allow(dead_code)]

use flatsql::{Executor, Query, Result, StorageConfig, Table};
use tempfile::TempDir;

/// Test harness: an executor rooted in a fresh temporary table directory.
pub struct TestContext {
    pub executor: Executor,
    pub config: StorageConfig,
    _dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let config = StorageConfig::new(dir.path());
        Self {
            executor: Executor::new(config.clone()),
            config,
            _dir: dir,
        }
    }

    /// Parses and executes one statement.
    pub fn exec(&self, sql: &str) -> Result<Option<Box<dyn Table>>> {
        self.executor.execute(Query::parse(sql)?)
    }

    /// Executes a statement that must succeed.
    pub fn run(&self, sql: &str) {
        if let Err(e) = self.exec(sql) {
            panic!("query failed: {} -> {}", sql, e);
        }
    }

    /// Runs a SELECT and collects every row's raw cell values.
    pub fn rows(&self, sql: &str) -> Vec<Vec<String>> {
        let mut table = self
            .exec(sql)
            .unwrap_or_else(|e| panic!("query failed: {} -> {}", sql, e))
            .expect("query returned no result stream");
        let mut rows = Vec::new();
        while let Some(row) = table.next_row().expect("row pull failed") {
            rows.push(
                row.columns()
                    .iter()
                    .map(|c| c.raw_value().to_string())
                    .collect(),
            );
        }
        rows
    }

    /// Error message of a statement that must fail.
    pub fn error(&self, sql: &str) -> String {
        match self.exec(sql) {
            Err(e) => e.to_string(),
            Ok(_) => panic!("query unexpectedly succeeded: {}", sql),
        }
    }

    /// Raw bytes of a table's backing file.
    pub fn table_file(&self, table: &str) -> String {
        std::fs::read_to_string(self.config.table_path(table)).expect("table file missing")
    }
}

/// A two-column table with a few rows, used across the suite.
pub fn users_table(ctx: &TestContext) {
    ctx.run("CREATE TABLE users ( id int, name varchar(10), PRIMARY KEY ( id ) ) ;");
    ctx.run("INSERT INTO users ( id , name ) VALUES ( 1 , \"abc\" ) ;");
    ctx.run("INSERT INTO users ( id , name ) VALUES ( 2 , \"def\" ) ;");
    ctx.run("INSERT INTO users ( id , name ) VALUES ( 3 , \"ghi\" ) ;");
}
