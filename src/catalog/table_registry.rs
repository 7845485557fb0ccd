use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::common::{DatabaseError, Result};
use crate::row::TableSchema;
use crate::storage::TableFile;

/// Holds every open table by name. Each table may be open at most once;
/// concurrent writers against the same file would corrupt its index.
pub struct TableRegistry {
    tables: HashMap<String, TableFile>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Opens (creating if absent) a table at `path` and registers it under
    /// its schema's table name.
    pub fn create_table<P: AsRef<Path>>(
        &mut self,
        schema: Arc<TableSchema>,
        path: P,
    ) -> Result<&mut TableFile> {
        let name = schema.table_name().to_string();
        if self.tables.contains_key(&name) {
            return Err(DatabaseError::TableAlreadyExists(name));
        }
        let table = TableFile::open(schema, path)?;
        Ok(self.tables.entry(name).or_insert(table))
    }

    /// Registers a table that was opened externally.
    pub fn register_table(&mut self, table: TableFile) -> Result<()> {
        let name = table.schema().table_name().to_string();
        if self.tables.contains_key(&name) {
            return Err(DatabaseError::TableAlreadyExists(name));
        }
        self.tables.insert(name, table);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Result<&TableFile> {
        self.tables
            .get(name)
            .ok_or_else(|| DatabaseError::TableNotFound(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut TableFile> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DatabaseError::TableNotFound(name.to_string()))
    }

    pub fn schema(&self, name: &str) -> Result<&Arc<TableSchema>> {
        Ok(self.table(name)?.schema())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Closes every registered table, releasing their file handles.
    pub fn close_all(&mut self) -> Result<()> {
        for (_, table) in self.tables.drain() {
            table.close()?;
        }
        Ok(())
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{ColumnType, Row, Value};
    use tempfile::tempdir;

    fn item_schema() -> Arc<TableSchema> {
        TableSchema::builder("items")
            .column("id", ColumnType::Int)
            .column("label", ColumnType::String)
            .build_arc()
    }

    #[test]
    fn test_create_and_fetch_table() {
        let dir = tempdir().unwrap();
        let mut registry = TableRegistry::new();

        registry
            .create_table(item_schema(), dir.path().join("items.tbl"))
            .unwrap();

        assert!(registry.contains("items"));
        assert_eq!(registry.schema("items").unwrap().table_name(), "items");

        let table = registry.table_mut("items").unwrap();
        let schema = Arc::clone(table.schema());
        table
            .insert(
                Row::new(
                    schema,
                    vec![Value::Int(1), Value::String("widget".to_string())],
                )
                .unwrap(),
            )
            .unwrap();
        assert_eq!(registry.table("items").unwrap().row_count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let dir = tempdir().unwrap();
        let mut registry = TableRegistry::new();

        registry
            .create_table(item_schema(), dir.path().join("items.tbl"))
            .unwrap();
        let err = registry
            .create_table(item_schema(), dir.path().join("other.tbl"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::TableAlreadyExists(_)));
    }

    #[test]
    fn test_unknown_table_rejected() {
        let registry = TableRegistry::new();
        assert!(matches!(
            registry.table("ghost").unwrap_err(),
            DatabaseError::TableNotFound(_)
        ));
    }

    #[test]
    fn test_close_all_drains_registry() {
        let dir = tempdir().unwrap();
        let mut registry = TableRegistry::new();

        registry
            .create_table(item_schema(), dir.path().join("items.tbl"))
            .unwrap();
        registry.close_all().unwrap();
        assert!(!registry.contains("items"));
    }
}
