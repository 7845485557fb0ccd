use std::fmt;
use std::hash::{Hash, Hasher};

use bytes::{Buf, BufMut};

use crate::common::{DatabaseError, Result};

use super::ColumnType;

/// A typed value stored in one column of a row.
///
/// Values serve double duty as primary-key entries in the in-memory index,
/// so equality and hashing must agree for every variant: Float and Double
/// compare and hash by IEEE-754 bit pattern.
#[derive(Debug, Clone)]
pub enum Value {
    /// 32-bit signed integer
    Int(i32),

    /// UTF-8 string
    String(String),

    /// Boolean
    Boolean(bool),

    /// 32-bit floating point
    Float(f32),

    /// 64-bit floating point
    Double(f64),
}

impl Value {
    /// Returns the column type this value encodes as.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Int(_) => ColumnType::Int,
            Value::String(_) => ColumnType::String,
            Value::Boolean(_) => ColumnType::Boolean,
            Value::Float(_) => ColumnType::Float,
            Value::Double(_) => ColumnType::Double,
        }
    }

    /// Returns true if this value is valid for a column of the given type.
    pub fn matches(&self, column_type: ColumnType) -> bool {
        self.column_type() == column_type
    }

    /// Appends this value's encoding to `out`. Integers and floats are
    /// big-endian; strings carry a 4-byte length prefix followed by UTF-8
    /// bytes; booleans are a single 0/1 byte.
    pub fn encode(&self, out: &mut impl BufMut) {
        match self {
            Value::Int(v) => out.put_i32(*v),
            Value::String(s) => {
                let bytes = s.as_bytes();
                out.put_i32(bytes.len() as i32);
                out.put_slice(bytes);
            }
            Value::Boolean(b) => out.put_u8(if *b { 1 } else { 0 }),
            Value::Float(v) => out.put_f32(*v),
            Value::Double(v) => out.put_f64(*v),
        }
    }

    /// Reads one value of the given type from `buf`, advancing the cursor
    /// past exactly the bytes consumed.
    pub fn decode(buf: &mut &[u8], column_type: ColumnType) -> Result<Value> {
        match column_type {
            ColumnType::Int => {
                ensure_remaining(buf, 4, column_type)?;
                Ok(Value::Int(buf.get_i32()))
            }
            ColumnType::String => {
                ensure_remaining(buf, 4, column_type)?;
                let len = buf.get_i32();
                if len < 0 || len as usize > buf.remaining() {
                    return Err(DatabaseError::MalformedSlot(format!(
                        "string length {} exceeds slot bounds",
                        len
                    )));
                }
                let bytes = buf.copy_to_bytes(len as usize);
                Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
            }
            ColumnType::Boolean => {
                ensure_remaining(buf, 1, column_type)?;
                Ok(Value::Boolean(buf.get_u8() != 0))
            }
            ColumnType::Float => {
                ensure_remaining(buf, 4, column_type)?;
                Ok(Value::Float(buf.get_f32()))
            }
            ColumnType::Double => {
                ensure_remaining(buf, 8, column_type)?;
                Ok(Value::Double(buf.get_f64()))
            }
        }
    }

    /// Advances the cursor past one value of the given type without
    /// materializing it.
    pub fn skip(buf: &mut &[u8], column_type: ColumnType) -> Result<()> {
        match column_type.fixed_size() {
            Some(size) => {
                ensure_remaining(buf, size, column_type)?;
                buf.advance(size);
            }
            None => {
                ensure_remaining(buf, 4, column_type)?;
                let len = buf.get_i32();
                if len < 0 || len as usize > buf.remaining() {
                    return Err(DatabaseError::MalformedSlot(format!(
                        "string length {} exceeds slot bounds",
                        len
                    )));
                }
                buf.advance(len as usize);
            }
        }
        Ok(())
    }
}

fn ensure_remaining(buf: &[u8], needed: usize, column_type: ColumnType) -> Result<()> {
    if buf.len() < needed {
        return Err(DatabaseError::MalformedSlot(format!(
            "truncated {} value",
            column_type
        )));
    }
    Ok(())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(v) => v.hash(state),
            Value::String(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
        }
    }
}

// Convenience conversions
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}
