use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{DatabaseError, Result, DEFAULT_DATA_DIR, TABLE_FILE_EXTENSION};

/// Maps database names to directories under a data root, and table names to
/// file paths within the selected database. Table files never pick their
/// own paths; they are handed one from here.
pub struct DatabaseManager {
    data_dir: PathBuf,
    current: Option<String>,
}

impl DatabaseManager {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            current: None,
        }
    }

    /// Creates a new database directory.
    pub fn create_database(&self, name: &str) -> Result<()> {
        let path = self.data_dir.join(name);
        if path.exists() {
            return Err(DatabaseError::DatabaseAlreadyExists(name.to_string()));
        }
        fs::create_dir_all(&path)?;
        tracing::info!("created database {}", name);
        Ok(())
    }

    /// Selects an existing database as the target for table paths.
    pub fn use_database(&mut self, name: &str) -> Result<()> {
        if !self.data_dir.join(name).is_dir() {
            return Err(DatabaseError::DatabaseNotFound(name.to_string()));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Name of the selected database.
    pub fn current_database(&self) -> Result<&str> {
        self.current
            .as_deref()
            .ok_or(DatabaseError::NoDatabaseSelected)
    }

    /// Directory of the selected database.
    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir.join(self.current_database()?))
    }

    /// File path for a table inside the selected database.
    pub fn table_path(&self, table_name: &str) -> Result<PathBuf> {
        Ok(self
            .database_path()?
            .join(format!("{}.{}", table_name, TABLE_FILE_EXTENSION)))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for DatabaseManager {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}
