mod config;
mod error;
mod types;

pub use config::*;
pub use error::{DatabaseError, Result};
pub use types::{PageId, RowLocation};
