use thiserror::Error;

use crate::row::{ColumnType, Value};

/// Database error types
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("primary key violation: key {0} already exists")]
    PrimaryKeyViolation(Value),

    #[error("primary key is immutable: cannot change {expected} to {actual}")]
    PrimaryKeyImmutable { expected: Value, actual: Value },

    #[error("column {column} is declared {expected} but got {value}")]
    SchemaMismatch {
        column: String,
        expected: ColumnType,
        value: Value,
    },

    #[error("table {table} has {expected} columns but row carries {found} values")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    #[error("row of {row_size} bytes cannot fit in any page ({available} bytes available)")]
    PageOverflow { row_size: usize, available: usize },

    #[error("malformed row slot: {0}")]
    MalformedSlot(String),

    #[error("database {0} already exists")]
    DatabaseAlreadyExists(String),

    #[error("database {0} not found")]
    DatabaseNotFound(String),

    #[error("no database selected")]
    NoDatabaseSelected,

    #[error("table {0} already exists")]
    TableAlreadyExists(String),

    #[error("table {0} not found")]
    TableNotFound(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
