/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Size of the per-page header: row count (4 bytes) + free-space offset (4 bytes)
pub const PAGE_HEADER_SIZE: usize = 8;

/// Largest slot (tombstone flag + encoded row) that fits in a page
pub const MAX_SLOT_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE;

/// File extension for table files
pub const TABLE_FILE_EXTENSION: &str = "tbl";

/// Default root directory for databases
pub const DEFAULT_DATA_DIR: &str = "data";
