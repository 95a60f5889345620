//! Storage configuration

use std::path::PathBuf;

/// Where table files live. One file per table, `<data_dir>/<name>.table`,
/// with `<name>.tmp` used transiently during rewrites.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base directory for table files
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tables"),
        }
    }
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Config rooted in a fresh temporary directory (kept on disk so table
    /// files survive for the duration of a test).
    pub fn for_testing() -> Self {
        let data_dir = tempfile::tempdir()
            .expect("Failed to create temporary directory")
            .keep();
        Self { data_dir }
    }

    /// Path of a table's backing file.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{}.table", table))
    }

    /// Path of the temp file used while rewriting a table.
    pub fn temp_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{}.tmp", table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let config = StorageConfig::new("/data");
        assert_eq!(config.table_path("t"), PathBuf::from("/data/t.table"));
        assert_eq!(config.temp_path("t"), PathBuf::from("/data/t.tmp"));
    }

    #[test]
    fn test_default_directory() {
        assert_eq!(StorageConfig::default().data_dir, PathBuf::from("./tables"));
    }
}
