//! KIP-482 tagged fields.
//!
//! ### Protocol Def
//! ```text
//! TAG_BUFFER => num_tagged_fields [tag size data]
//!   num_tagged_fields => UNSIGNED_VARINT
//!   tag => UNSIGNED_VARINT
//!   size => UNSIGNED_VARINT
//!   data => BYTES(size)
//! ```
//!
//! Flexible versions end every struct (and the v2 request header / v1
//! response header) with a tag buffer. The codec does not interpret any tag;
//! fields are carried as opaque data so that a decoded value re-encodes to
//! the same bytes.
use bytes::Bytes;
use nombytes::NomBytes;

use crate::encode::{PacketEncoder, ToByte};
use crate::error::{Error, Result};
use crate::parser::{parse_uvarint, parse_uvarint32, FromByte, ParseResult, MAX_ARRAY_LENGTH};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaggedField {
    pub tag: u32,
    pub data: Bytes,
}

/// Ordered list of tagged fields, empty in the common case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaggedFields(pub Vec<TaggedField>);

impl TaggedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, tag: u32) -> Option<&Bytes> {
        self.0.iter().find(|f| f.tag == tag).map(|f| &f.data)
    }

    /// Add or replace a field, keeping tags in ascending order.
    pub fn insert(&mut self, tag: u32, data: Bytes) {
        match self.0.binary_search_by_key(&tag, |f| f.tag) {
            Ok(i) => self.0[i].data = data,
            Err(i) => self.0.insert(i, TaggedField { tag, data }),
        }
    }
}

impl FromByte for TaggedFields {
    fn decode(s: NomBytes) -> ParseResult<Self> {
        let (mut s, count) = parse_uvarint(s)?;
        if count > MAX_ARRAY_LENGTH as u64 {
            return Err(nom::Err::Failure(Error::InvalidArrayLength(
                i64::try_from(count).unwrap_or(i64::MAX),
            )));
        }
        // each field is at least two bytes: tag and size
        if count > (nom::InputLength::input_len(&s) / 2) as u64 {
            return Err(nom::Err::Failure(Error::InsufficientData));
        }

        let mut fields: Vec<TaggedField> = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (rest, tag) = parse_uvarint32(s)?;
            if let Some(last) = fields.last() {
                if tag <= last.tag {
                    return Err(nom::Err::Failure(Error::PacketDecoding(format!(
                        "tagged field {} out of order after {}",
                        tag, last.tag
                    ))));
                }
            }
            let (rest, size) = parse_uvarint32(rest)?;
            let (rest, data) = crate::parser::take_raw(rest, size as usize)?;
            fields.push(TaggedField { tag, data });
            s = rest;
        }
        Ok((s, TaggedFields(fields)))
    }
}

impl ToByte for TaggedFields {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_uvarint(self.0.len() as u64);
        for field in &self.0 {
            pe.put_uvarint(field.tag.into());
            pe.put_uvarint(field.data.len() as u64);
            pe.put_raw_bytes(&field.data);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encode::encode;

    #[test]
    fn empty() {
        let buf = encode(&TaggedFields::new()).unwrap();
        assert_eq!(buf.as_ref(), [0]);

        let (rest, fields) = TaggedFields::decode(NomBytes::from(&b"\x00\x07"[..])).unwrap();
        assert!(fields.is_empty());
        assert_eq!(rest, NomBytes::from(&b"\x07"[..]));
    }

    #[test]
    fn encode_and_parse() {
        let mut fields = TaggedFields::new();
        fields.insert(3, Bytes::from_static(b"abc"));
        fields.insert(0, Bytes::from_static(b"\x01"));

        let buf = encode(&fields).unwrap();
        assert_eq!(buf.as_ref(), [2, 0, 1, 1, 3, 3, b'a', b'b', b'c']);

        let (_, parsed) = TaggedFields::decode(NomBytes::new(buf)).unwrap();
        assert_eq!(parsed, fields);
        assert_eq!(parsed.get(3), Some(&Bytes::from_static(b"abc")));
    }

    #[test]
    fn out_of_order_tags() {
        let buf = NomBytes::from(&[2u8, 5, 0, 1, 0][..]);
        assert!(matches!(
            TaggedFields::decode(buf),
            Err(nom::Err::Failure(Error::PacketDecoding(_)))
        ));
    }

    #[test]
    fn count_beyond_the_buffer() {
        // 50_000_000 fields announced, 100 bytes follow
        let mut buf = vec![0x80, 0xe1, 0xeb, 0x17];
        buf.extend_from_slice(&[0; 100]);
        assert_eq!(
            Error::from(TaggedFields::decode(NomBytes::from(&buf[..])).unwrap_err()),
            Error::InvalidArrayLength(50_000_000)
        );

        // within the bound, but more fields than the bytes can hold
        let mut buf = vec![4];
        buf.extend_from_slice(&[0, 0, 1, 0, 2]);
        assert_eq!(
            Error::from(TaggedFields::decode(NomBytes::from(&buf[..])).unwrap_err()),
            Error::InsufficientData
        );
    }

    #[test]
    fn truncated_data() {
        let buf = NomBytes::from(&[1u8, 0, 4, 1, 2][..]);
        assert_eq!(
            Error::from(TaggedFields::decode(buf).unwrap_err()),
            Error::InsufficientData
        );
    }
}
