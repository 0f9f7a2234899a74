//! Declarative message schemas.
//!
//! A [`Schema`] is an ordered list of named [`Field`]s, each with a
//! [`FieldType`]. Decoding a buffer against a schema yields a generic
//! [`Struct`] whose values can be read and replaced by field name; encoding
//! the struct writes every field back in schema order. This lets a response
//! be decoded, changed in a few places and written out again without a
//! hand-written type per message version.
//!
//! Schemas are built once into process-wide tables and never change
//! afterwards.
//!
//! ```rust
//! use std::sync::Arc;
//! use kafka_proxy_codec::prelude::schema::{decode_schema, encode_schema, Field, FieldType, Schema, Value};
//!
//! let schema = Arc::new(Schema::new(
//!     "broker",
//!     vec![
//!         Field::new("host", FieldType::String),
//!         Field::new("port", FieldType::Int32),
//!     ],
//! ));
//!
//! let buf = bytes::Bytes::from_static(b"\x00\x09localhost\x00\x00\x23\x84");
//! let mut broker = decode_schema(buf.clone(), &schema).unwrap();
//! assert_eq!(broker.get_str("host").unwrap(), "localhost");
//!
//! broker.replace("port", Value::Int32(9093)).unwrap();
//! let out = encode_schema(&broker, &schema).unwrap();
//! assert_eq!(out.len(), buf.len());
//! ```
mod value;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use nom::combinator::map;
use nombytes::NomBytes;

use crate::encode::{self, PacketEncoder, ToByte};
use crate::error::{Error, Result};
use crate::parser::{self, FromByte, ParseResult};
use crate::tagged_fields::TaggedFields;

pub use value::{Struct, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Unsigned base-128 varint.
    UVarint,
    /// Signed zigzag varint.
    Varint,
    Uuid,
    String,
    NullableString,
    CompactString,
    CompactNullableString,
    Bytes,
    NullableBytes,
    CompactBytes,
    CompactNullableBytes,
    /// `i32` size followed by an opaque record set; `-1` is null.
    MessageSet,
    /// Classic `i32`-counted array.
    Array(Box<FieldType>),
    /// Compact `uvarint(len + 1)`-counted array.
    CompactArray(Box<FieldType>),
    Struct(Arc<Schema>),
    TaggedFields,
}

impl FieldType {
    pub fn array(inner: FieldType) -> Self {
        FieldType::Array(Box::new(inner))
    }

    pub fn compact_array(inner: FieldType) -> Self {
        FieldType::CompactArray(Box::new(inner))
    }

    pub fn structure(schema: Schema) -> Self {
        FieldType::Struct(Arc::new(schema))
    }

    fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int8 => "int8",
            FieldType::Int16 => "int16",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::UVarint => "uvarint",
            FieldType::Varint => "varint",
            FieldType::Uuid => "uuid",
            FieldType::String => "string",
            FieldType::NullableString => "nullable string",
            FieldType::CompactString => "compact string",
            FieldType::CompactNullableString => "compact nullable string",
            FieldType::Bytes => "bytes",
            FieldType::NullableBytes => "nullable bytes",
            FieldType::CompactBytes => "compact bytes",
            FieldType::CompactNullableBytes => "compact nullable bytes",
            FieldType::MessageSet => "message set",
            FieldType::Array(_) => "array",
            FieldType::CompactArray(_) => "compact array",
            FieldType::Struct(_) => "struct",
            FieldType::TaggedFields => "tagged fields",
        }
    }

    pub fn parse(&self, s: NomBytes) -> ParseResult<Value> {
        match self {
            FieldType::Bool => map(parser::parse_bool, Value::Bool)(s),
            FieldType::Int8 => map(parser::parse_i8, Value::Int8)(s),
            FieldType::Int16 => map(parser::parse_i16, Value::Int16)(s),
            FieldType::Int32 => map(parser::parse_i32, Value::Int32)(s),
            FieldType::Int64 => map(parser::parse_i64, Value::Int64)(s),
            FieldType::UVarint => map(parser::parse_uvarint, Value::UVarint)(s),
            FieldType::Varint => map(parser::parse_varint, Value::Varint)(s),
            FieldType::Uuid => map(parser::parse_uuid, Value::Uuid)(s),
            FieldType::String => map(parser::parse_string, Value::Str)(s),
            FieldType::NullableString => {
                map(parser::parse_nullable_string, Value::NullableStr)(s)
            }
            FieldType::CompactString => map(parser::parse_compact_string, Value::Str)(s),
            FieldType::CompactNullableString => {
                map(parser::parse_compact_nullable_string, Value::NullableStr)(s)
            }
            FieldType::Bytes => map(parser::parse_bytes, Value::Bytes)(s),
            FieldType::NullableBytes | FieldType::MessageSet => {
                map(parser::parse_nullable_bytes, Value::NullableBytes)(s)
            }
            FieldType::CompactBytes => map(parser::parse_compact_bytes, Value::Bytes)(s),
            FieldType::CompactNullableBytes => {
                map(parser::parse_compact_nullable_bytes, Value::NullableBytes)(s)
            }
            FieldType::Array(inner) => {
                map(parser::parse_nullable_array(|s: NomBytes| inner.parse(s)), Value::Array)(s)
            }
            FieldType::CompactArray(inner) => map(
                parser::parse_compact_nullable_array(|s: NomBytes| inner.parse(s)),
                Value::Array,
            )(s),
            FieldType::Struct(schema) => map(|s: NomBytes| parse_struct(schema, s), Value::Struct)(s),
            FieldType::TaggedFields => map(TaggedFields::decode, Value::TaggedFields)(s),
        }
    }

    pub fn encode<E: PacketEncoder>(&self, field: &str, value: &Value, pe: &mut E) -> Result<()> {
        match (self, value) {
            (FieldType::Bool, Value::Bool(v)) => pe.put_bool(*v),
            (FieldType::Int8, Value::Int8(v)) => pe.put_i8(*v),
            (FieldType::Int16, Value::Int16(v)) => pe.put_i16(*v),
            (FieldType::Int32, Value::Int32(v)) => pe.put_i32(*v),
            (FieldType::Int64, Value::Int64(v)) => pe.put_i64(*v),
            (FieldType::UVarint, Value::UVarint(v)) => pe.put_uvarint(*v),
            (FieldType::Varint, Value::Varint(v)) => pe.put_varint(*v),
            (FieldType::Uuid, Value::Uuid(v)) => pe.put_uuid(v),
            (FieldType::String, Value::Str(v)) => pe.put_string(v)?,
            (FieldType::NullableString, Value::NullableStr(v)) => {
                pe.put_nullable_string(v.as_deref())?
            }
            (FieldType::CompactString, Value::Str(v)) => pe.put_compact_string(v)?,
            (FieldType::CompactNullableString, Value::NullableStr(v)) => {
                pe.put_compact_nullable_string(v.as_deref())?
            }
            (FieldType::Bytes, Value::Bytes(v)) => pe.put_bytes(v)?,
            (FieldType::NullableBytes | FieldType::MessageSet, Value::NullableBytes(v)) => {
                pe.put_nullable_bytes(v.as_deref())?
            }
            (FieldType::CompactBytes, Value::Bytes(v)) => pe.put_compact_bytes(v)?,
            (FieldType::CompactNullableBytes, Value::NullableBytes(v)) => {
                pe.put_compact_nullable_bytes(v.as_deref())?
            }
            (FieldType::Array(inner), Value::Array(v)) => {
                encode::encode_as_nullable_array(pe, v.as_deref(), |pe, item| {
                    inner.encode(field, item, pe)
                })?
            }
            (FieldType::CompactArray(inner), Value::Array(v)) => {
                encode::encode_as_compact_nullable_array(pe, v.as_deref(), |pe, item| {
                    inner.encode(field, item, pe)
                })?
            }
            (FieldType::Struct(schema), Value::Struct(v)) => {
                if !Arc::ptr_eq(schema, v.schema()) && **schema != **v.schema() {
                    return Err(Error::SchemaEncoding(format!(
                        "field {}: expected struct {}, found struct {}",
                        field,
                        schema.name(),
                        v.schema().name()
                    )));
                }
                v.encode(pe)?
            }
            (FieldType::TaggedFields, Value::TaggedFields(v)) => v.encode(pe)?,
            (ty, v) => {
                return Err(Error::SchemaEncoding(format!(
                    "field {}: expected {}, found {}",
                    field,
                    ty.name(),
                    v.kind()
                )))
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

impl Field {
    pub fn new(name: &'static str, ty: FieldType) -> Self {
        Field { name, ty }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    name: &'static str,
    fields: Vec<Field>,
    by_name: HashMap<&'static str, usize>,
}

impl Schema {
    /// Build a schema from static field tables.
    ///
    /// # Panics
    /// On a duplicate field name. See [`Schema::try_new`].
    pub fn new(name: &'static str, fields: Vec<Field>) -> Self {
        match Self::try_new(name, fields) {
            Ok(schema) => schema,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_new(name: &'static str, fields: Vec<Field>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if by_name.insert(field.name, i).is_some() {
                return Err(Error::SchemaEncoding(format!(
                    "duplicate field {} in schema {}",
                    field.name, name
                )));
            }
        }
        Ok(Schema {
            name,
            fields,
            by_name,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

/// Parse one struct of `schema`.
pub fn parse_struct(schema: &Arc<Schema>, s: NomBytes) -> ParseResult<Struct> {
    let mut values = Vec::with_capacity(schema.fields.len());
    let mut remainder = s;
    for field in &schema.fields {
        let (rest, value) = field.ty.parse(remainder)?;
        values.push(value);
        remainder = rest;
    }
    Ok((remainder, Struct::new(Arc::clone(schema), values)))
}

impl ToByte for Struct {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        let fields = self.schema().fields();
        if fields.len() != self.values().len() {
            return Err(Error::SchemaEncoding(format!(
                "struct {} has {} values for {} fields",
                self.schema().name(),
                self.values().len(),
                fields.len()
            )));
        }
        for (field, value) in fields.iter().zip(self.values()) {
            field.ty.encode(field.name, value, pe)?;
        }
        Ok(())
    }
}

/// Decode a whole buffer as one struct of `schema`. Bytes left over after
/// the last field mean the schema does not describe the message.
pub fn decode_schema(buf: Bytes, schema: &Arc<Schema>) -> Result<Struct> {
    tracing::trace!("Decoding {} bytes as {}", buf.len(), schema.name());
    let (rest, value) = parse_struct(schema, NomBytes::new(buf))?;
    let remaining = nom::InputLength::input_len(&rest);
    if remaining != 0 {
        return Err(Error::SchemaDecoding(format!(
            "{} bytes remaining after decoding {}",
            remaining,
            schema.name()
        )));
    }
    Ok(value)
}

/// Encode `value` as `schema` into an exactly sized buffer.
pub fn encode_schema(value: &Struct, schema: &Arc<Schema>) -> Result<Bytes> {
    if !Arc::ptr_eq(schema, value.schema()) && **schema != **value.schema() {
        return Err(Error::SchemaEncoding(format!(
            "struct {} encoded as {}",
            value.schema().name(),
            schema.name()
        )));
    }
    tracing::trace!("Encoding {}", schema.name());
    encode::encode(value)
}

#[cfg(test)]
mod test {
    use super::*;

    fn broker_schema() -> Arc<Schema> {
        Arc::new(Schema::new(
            "broker",
            vec![
                Field::new("node_id", FieldType::Int32),
                Field::new("host", FieldType::String),
                Field::new("port", FieldType::Int32),
                Field::new("rack", FieldType::NullableString),
            ],
        ))
    }

    fn compact_schema() -> Arc<Schema> {
        Arc::new(Schema::new(
            "compact",
            vec![
                Field::new("s", FieldType::CompactString),
                Field::new("ns", FieldType::CompactNullableString),
                Field::new("b", FieldType::CompactBytes),
                Field::new("nb", FieldType::CompactNullableBytes),
                Field::new("ids", FieldType::compact_array(FieldType::Int32)),
                Field::new("_tagged_fields", FieldType::TaggedFields),
            ],
        ))
    }

    fn classic_schema() -> Arc<Schema> {
        Arc::new(Schema::new(
            "classic",
            vec![
                Field::new("s", FieldType::String),
                Field::new("ns", FieldType::NullableString),
                Field::new("b", FieldType::Bytes),
                Field::new("nb", FieldType::NullableBytes),
                Field::new("ids", FieldType::array(FieldType::Int32)),
            ],
        ))
    }

    #[test]
    #[should_panic]
    fn duplicate_field_names() {
        Schema::new(
            "dup",
            vec![
                Field::new("a", FieldType::Int8),
                Field::new("a", FieldType::Int16),
            ],
        );
    }

    #[test]
    fn try_new_duplicate() {
        let res = Schema::try_new(
            "dup",
            vec![
                Field::new("a", FieldType::Int8),
                Field::new("a", FieldType::Int8),
            ],
        );
        assert!(matches!(res, Err(Error::SchemaEncoding(_))));
    }

    #[test]
    fn decode_and_encode_broker() {
        let buf = Bytes::from_static(&[
            0, 0, 0, 1, // node_id
            0, 3, b'f', b'o', b'o', // host
            0, 0, 0x23, 0x84, // port
            0xff, 0xff, // rack
        ]);
        let schema = broker_schema();
        let broker = decode_schema(buf.clone(), &schema).unwrap();
        assert_eq!(broker.get_i32("node_id").unwrap(), 1);
        assert_eq!(broker.get_str("host").unwrap(), "foo");
        assert_eq!(broker.get_i32("port").unwrap(), 9092);
        assert_eq!(broker.get_nullable_str("rack").unwrap(), None);

        assert_eq!(encode_schema(&broker, &schema).unwrap(), buf);
    }

    #[test]
    fn leftover_bytes() {
        let buf = Bytes::from_static(&[0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0x07]);
        assert!(matches!(
            decode_schema(buf, &broker_schema()),
            Err(Error::SchemaDecoding(_))
        ));
    }

    #[test]
    fn truncated() {
        let buf = Bytes::from_static(&[0, 0, 0, 1, 0, 3, b'f']);
        assert_eq!(
            decode_schema(buf, &broker_schema()),
            Err(Error::InsufficientData)
        );
    }

    #[test]
    fn value_count_mismatch() {
        let schema = broker_schema();
        let value = Struct::new(schema.clone(), vec![Value::Int32(1)]);
        assert!(matches!(
            encode_schema(&value, &schema),
            Err(Error::SchemaEncoding(_))
        ));
    }

    #[test]
    fn value_type_mismatch() {
        let schema = broker_schema();
        let value = Struct::new(
            schema.clone(),
            vec![
                Value::Int32(1),
                Value::Bool(true),
                Value::Int32(9092),
                Value::NullableStr(None),
            ],
        );
        assert!(matches!(
            encode_schema(&value, &schema),
            Err(Error::SchemaEncoding(_))
        ));
    }

    #[test]
    fn wrong_schema() {
        let value = Struct::new(classic_schema(), vec![]);
        assert!(matches!(
            encode_schema(&value, &broker_schema()),
            Err(Error::SchemaEncoding(_))
        ));
    }

    fn roundtrip(schema: &Arc<Schema>, values: Vec<Value>) {
        let value = Struct::new(schema.clone(), values);
        let buf = encode_schema(&value, schema).unwrap();
        assert_eq!(decode_schema(buf, schema).unwrap(), value);
    }

    #[test]
    fn boundary_lengths() {
        let lengths = [0, 1, 2, 3, 4, 16, 63, 64, 127, 128, 8191, 8192, 32767];
        for len in lengths {
            let s = "x".repeat(len);
            let b = Bytes::from(vec![7u8; len]);
            let ids: Vec<Value> = (0..len.min(300) as i32).map(Value::Int32).collect();

            roundtrip(
                &compact_schema(),
                vec![
                    Value::Str(s.clone()),
                    Value::NullableStr(Some(s.clone())),
                    Value::Bytes(b.clone()),
                    Value::NullableBytes(Some(b.clone())),
                    Value::Array(Some(ids.clone())),
                    Value::TaggedFields(TaggedFields::default()),
                ],
            );
            roundtrip(
                &classic_schema(),
                vec![
                    Value::Str(s.clone()),
                    Value::NullableStr(Some(s)),
                    Value::Bytes(b.clone()),
                    Value::NullableBytes(Some(b)),
                    Value::Array(Some(ids)),
                ],
            );
        }
    }

    #[test]
    fn null_and_empty_survive() {
        roundtrip(
            &compact_schema(),
            vec![
                Value::Str(String::new()),
                Value::NullableStr(None),
                Value::Bytes(Bytes::new()),
                Value::NullableBytes(None),
                Value::Array(None),
                Value::TaggedFields(TaggedFields::default()),
            ],
        );
        roundtrip(
            &classic_schema(),
            vec![
                Value::Str(String::new()),
                Value::NullableStr(None),
                Value::Bytes(Bytes::new()),
                Value::NullableBytes(None),
                Value::Array(Some(vec![])),
            ],
        );
        roundtrip(
            &classic_schema(),
            vec![
                Value::Str(String::new()),
                Value::NullableStr(Some(String::new())),
                Value::Bytes(Bytes::new()),
                Value::NullableBytes(Some(Bytes::new())),
                Value::Array(None),
            ],
        );
    }

    #[test]
    fn varints_roundtrip() {
        let schema = Arc::new(Schema::new(
            "varints",
            vec![
                Field::new("u", FieldType::UVarint),
                Field::new("z", FieldType::Varint),
            ],
        ));
        for n in [0i64, 1, -1, 64, -65, 300, -300, i64::MAX, i64::MIN] {
            roundtrip(&schema, vec![Value::UVarint(n as u64), Value::Varint(n)]);
        }
    }

    #[test]
    fn nested_struct() {
        let schema = Arc::new(Schema::new(
            "outer",
            vec![
                Field::new("brokers", FieldType::array(FieldType::Struct(broker_schema()))),
                Field::new("flag", FieldType::Bool),
            ],
        ));
        let inner = match &schema.fields()[0].ty {
            FieldType::Array(inner) => match inner.as_ref() {
                FieldType::Struct(s) => s.clone(),
                _ => unreachable!(),
            },
            _ => unreachable!(),
        };
        let broker = Struct::new(
            inner,
            vec![
                Value::Int32(0),
                Value::Str("a".into()),
                Value::Int32(1),
                Value::NullableStr(Some("r".into())),
            ],
        );
        roundtrip(
            &schema,
            vec![Value::Array(Some(vec![Value::Struct(broker)])), Value::Bool(false)],
        );
    }
}
