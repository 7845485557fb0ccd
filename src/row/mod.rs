mod column_type;
mod row;
mod schema;
mod value;

pub use column_type::ColumnType;
pub use row::Row;
pub use schema::{ColumnDef, TableSchema, TableSchemaBuilder};
pub use value::Value;
