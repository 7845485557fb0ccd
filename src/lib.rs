//! heapdb - a single-table-per-file heap storage engine
//!
//! heapdb persists typed rows to fixed-size 4096-byte disk pages, keeps an
//! in-memory primary-key index per table, and supports insert, update,
//! delete, point lookup, and full scans with tombstone-based soft deletion.
//! Deleted space is reclaimed by compaction, never reused in place.
//!
//! # Architecture
//!
//! The system is organized leaves-first:
//!
//! - **Row layer** (`row`): schema-driven typed values and the row codec
//!   - `TableSchema`/`ColumnDef`: static column list and primary-key column
//!   - `Value`: tagged value per column type (INT, STRING, BOOLEAN, FLOAT,
//!     DOUBLE), big-endian encoding with length-prefixed strings
//!   - `Row`: encode/decode/encoded_len against a schema
//!
//! - **Storage layer** (`storage`): pages, disk I/O, and the orchestrator
//!   - `HeapPage`: one fixed 4096-byte block with an 8-byte header
//!   - `DiskManager`: whole-page reads and writes against one table file
//!   - `TableFile`: CRUD, scans, the primary-key index, and compaction
//!
//! - **Catalog** (`catalog`): directory-per-database naming and the
//!   registry of open tables
//!
//! # Example
//!
//! ```rust,no_run
//! use heapdb::row::{ColumnType, Row, TableSchema, Value};
//! use heapdb::storage::TableFile;
//!
//! let schema = TableSchema::builder("users")
//!     .column("id", ColumnType::Int)
//!     .column("name", ColumnType::String)
//!     .build_arc();
//!
//! let mut users = TableFile::open(schema.clone(), "data/users.tbl").unwrap();
//! users
//!     .insert(Row::new(schema, vec![Value::Int(1), Value::from("Ada")]).unwrap())
//!     .unwrap();
//!
//! for row in users.read_all().unwrap() {
//!     println!("{}", row);
//! }
//! users.close().unwrap();
//! ```
//!
//! Each `TableFile` expects single-threaded, single-process access to its
//! backing file; independent tables are fully independent.

pub mod catalog;
pub mod common;
pub mod row;
pub mod storage;

// Re-export commonly used types at the crate root
pub use common::{DatabaseError, PageId, Result, RowLocation};
pub use row::{ColumnDef, ColumnType, Row, TableSchema, Value};
pub use storage::{DiskManager, HeapPage, TableFile, TableStats};
