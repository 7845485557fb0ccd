use std::sync::Arc;

use super::ColumnType;

/// A single column definition: name and declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    name: String,
    column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}

/// The static shape of a table: name, ordered columns, and which column
/// holds the primary key. Immutable once the table is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table_name: String,
    columns: Vec<ColumnDef>,
    primary_key_index: usize,
}

impl TableSchema {
    /// Creates a schema. The primary-key index must address one of the
    /// given columns.
    pub fn new(
        table_name: impl Into<String>,
        columns: Vec<ColumnDef>,
        primary_key_index: usize,
    ) -> Self {
        assert!(
            primary_key_index < columns.len(),
            "primary key index {} out of range for {} columns",
            primary_key_index,
            columns.len()
        );
        Self {
            table_name: table_name.into(),
            columns,
            primary_key_index,
        }
    }

    /// Creates a schema builder for fluent construction.
    pub fn builder(table_name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key_index: 0,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&ColumnDef> {
        self.columns.get(index)
    }

    pub fn primary_key_index(&self) -> usize {
        self.primary_key_index
    }

    pub fn primary_key_column(&self) -> &ColumnDef {
        &self.columns[self.primary_key_index]
    }
}

/// Builder for constructing table schemas fluently. The primary key
/// defaults to the first column.
pub struct TableSchemaBuilder {
    table_name: String,
    columns: Vec<ColumnDef>,
    primary_key_index: usize,
}

impl TableSchemaBuilder {
    /// Adds a column.
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnDef::new(name, column_type));
        self
    }

    /// Marks the column at `index` as the primary key.
    pub fn primary_key(mut self, index: usize) -> Self {
        self.primary_key_index = index;
        self
    }

    /// Builds the schema.
    pub fn build(self) -> TableSchema {
        TableSchema::new(self.table_name, self.columns, self.primary_key_index)
    }

    /// Builds the schema wrapped in an Arc for shared ownership.
    pub fn build_arc(self) -> Arc<TableSchema> {
        Arc::new(self.build())
    }
}
