//! Generic values produced and consumed by the schema engine.
use std::mem;
use std::sync::Arc;

use bytes::Bytes;

use super::Schema;
use crate::encode::Uuid;
use crate::error::{Error, Result};
use crate::tagged_fields::TaggedFields;

/// One decoded field. Compact and classic wire forms of the same type decode
/// to the same variant; the schema decides how it is written back.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UVarint(u64),
    Varint(i64),
    Uuid(Uuid),
    Str(String),
    NullableStr(Option<String>),
    Bytes(Bytes),
    NullableBytes(Option<Bytes>),
    /// `None` is a null array, kept apart from an empty one.
    Array(Option<Vec<Value>>),
    Struct(Struct),
    TaggedFields(TaggedFields),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UVarint(_) => "uvarint",
            Value::Varint(_) => "varint",
            Value::Uuid(_) => "uuid",
            Value::Str(_) => "string",
            Value::NullableStr(_) => "nullable string",
            Value::Bytes(_) => "bytes",
            Value::NullableBytes(_) => "nullable bytes",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::TaggedFields(_) => "tagged fields",
        }
    }

    pub fn same_kind(&self, other: &Value) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A decoded message: values in schema order, addressable by field name.
#[derive(Clone, Debug, PartialEq)]
pub struct Struct {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Struct {
    /// Values are not checked against the schema until the struct is
    /// encoded.
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> Self {
        Struct { schema, values }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    fn index(&self, name: &str) -> Result<usize> {
        self.schema.index_of(name).ok_or_else(|| {
            Error::SchemaDecoding(format!(
                "field {} not found in {}",
                name,
                self.schema.name()
            ))
        })
    }

    fn mismatch(&self, name: &str, expected: &str, found: &Value) -> Error {
        Error::SchemaDecoding(format!(
            "field {}.{}: expected {}, found {}",
            self.schema.name(),
            name,
            expected,
            found.kind()
        ))
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        let i = self.index(name)?;
        self.values
            .get(i)
            .ok_or_else(|| Error::SchemaDecoding(format!("field {} has no value", name)))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Value> {
        let i = self.index(name)?;
        self.values
            .get_mut(i)
            .ok_or_else(|| Error::SchemaDecoding(format!("field {} has no value", name)))
    }

    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.get(name)? {
            Value::Str(s) => Ok(s),
            Value::NullableStr(Some(s)) => Ok(s),
            other => Err(self.mismatch(name, "string", other)),
        }
    }

    pub fn get_nullable_str(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name)? {
            Value::Str(s) => Ok(Some(s)),
            Value::NullableStr(s) => Ok(s.as_deref()),
            other => Err(self.mismatch(name, "nullable string", other)),
        }
    }

    pub fn get_i16(&self, name: &str) -> Result<i16> {
        match self.get(name)? {
            Value::Int16(n) => Ok(*n),
            other => Err(self.mismatch(name, "int16", other)),
        }
    }

    pub fn get_i32(&self, name: &str) -> Result<i32> {
        match self.get(name)? {
            Value::Int32(n) => Ok(*n),
            other => Err(self.mismatch(name, "int32", other)),
        }
    }

    /// Elements of an array field; a null array has none.
    pub fn get_array(&self, name: &str) -> Result<&[Value]> {
        match self.get(name)? {
            Value::Array(Some(v)) => Ok(v),
            Value::Array(None) => Ok(&[]),
            other => Err(self.mismatch(name, "array", other)),
        }
    }

    pub fn get_array_mut(&mut self, name: &str) -> Result<&mut [Value]> {
        let i = self.index(name)?;
        let schema = self.schema.name();
        match self.values.get_mut(i) {
            Some(Value::Array(Some(v))) => Ok(v),
            Some(Value::Array(None)) => Ok(&mut []),
            Some(other) => Err(Error::SchemaDecoding(format!(
                "field {}.{}: expected array, found {}",
                schema,
                name,
                other.kind()
            ))),
            None => Err(Error::SchemaDecoding(format!("field {} has no value", name))),
        }
    }

    pub fn get_struct(&self, name: &str) -> Result<&Struct> {
        match self.get(name)? {
            Value::Struct(s) => Ok(s),
            other => Err(self.mismatch(name, "struct", other)),
        }
    }

    pub fn get_struct_mut(&mut self, name: &str) -> Result<&mut Struct> {
        let i = self.index(name)?;
        let schema = self.schema.name();
        match self.values.get_mut(i) {
            Some(Value::Struct(s)) => Ok(s),
            Some(other) => Err(Error::SchemaDecoding(format!(
                "field {}.{}: expected struct, found {}",
                schema,
                name,
                other.kind()
            ))),
            None => Err(Error::SchemaDecoding(format!("field {} has no value", name))),
        }
    }

    /// Swap in a new value for `name`, returning the old one. The new value
    /// must be of the same kind as the one it replaces.
    pub fn replace(&mut self, name: &str, value: Value) -> Result<Value> {
        let schema = self.schema.name();
        let slot = self.get_mut(name)?;
        if !slot.same_kind(&value) {
            return Err(Error::SchemaEncoding(format!(
                "cannot replace {} field {}.{} with {}",
                slot.kind(),
                schema,
                name,
                value.kind()
            )));
        }
        Ok(mem::replace(slot, value))
    }
}
