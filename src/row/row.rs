use std::fmt;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::common::{DatabaseError, Result};

use super::{TableSchema, Value};

/// One typed row of a table.
///
/// ## Row Binary Format
///
/// Values are encoded back to back in schema column order, with no padding
/// and no per-row header:
///
/// ```text
/// +-----------+-----------+-------+-----------+
/// | column 0  | column 1  |  ...  | column n  |
/// +-----------+-----------+-------+-----------+
/// ```
///
/// Fixed-width columns occupy their type's width; strings carry a 4-byte
/// length prefix. The encoded length of a row therefore depends on the
/// actual string contents, and two rows of the same table may differ in
/// size. Decoding is driven entirely by the schema: the cursor is advanced
/// exactly past the row's bytes, leaving it at the first byte of whatever
/// follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    schema: Arc<TableSchema>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row over the given schema. The value count must match the
    /// schema's column count; value *types* are checked at encode time.
    pub fn new(schema: Arc<TableSchema>, values: Vec<Value>) -> Result<Self> {
        if values.len() != schema.columns().len() {
            return Err(DatabaseError::ColumnCountMismatch {
                table: schema.table_name().to_string(),
                expected: schema.columns().len(),
                found: values.len(),
            });
        }
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The value of this row's primary-key column.
    pub fn primary_key(&self) -> &Value {
        &self.values[self.schema.primary_key_index()]
    }

    /// Encodes the row to bytes in schema column order. Fails with
    /// `SchemaMismatch` when a value's type disagrees with its column.
    pub fn encode(&self) -> Result<Bytes> {
        let mut out = BytesMut::new();
        for (column, value) in self.schema.columns().iter().zip(&self.values) {
            if !value.matches(column.column_type()) {
                return Err(DatabaseError::SchemaMismatch {
                    column: column.name().to_string(),
                    expected: column.column_type(),
                    value: value.clone(),
                });
            }
            value.encode(&mut out);
        }
        Ok(out.freeze())
    }

    /// Decodes one row from `buf`, advancing the cursor past exactly the
    /// row's bytes.
    pub fn decode(buf: &mut &[u8], schema: &Arc<TableSchema>) -> Result<Self> {
        let mut values = Vec::with_capacity(schema.columns().len());
        for column in schema.columns() {
            values.push(Value::decode(buf, column.column_type())?);
        }
        Ok(Self {
            schema: Arc::clone(schema),
            values,
        })
    }

    /// Computes the encoded length of the row at the start of `buf` without
    /// materializing any value. Delete and find walk slots with this to
    /// locate a target offset cheaply.
    pub fn encoded_len(buf: &[u8], schema: &TableSchema) -> Result<usize> {
        let mut cursor = buf;
        for column in schema.columns() {
            Value::skip(&mut cursor, column.column_type())?;
        }
        Ok(buf.len() - cursor.len())
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}
