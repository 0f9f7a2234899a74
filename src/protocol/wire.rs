//! Primitives whose encoding switches between the classic and the compact
//! form depending on whether a message version is flexible.
use bytes::Bytes;
use nom::Parser;
use nombytes::NomBytes;

use crate::encode::{self, PacketEncoder, ToByte};
use crate::error::{Error, Result};
use crate::parser::{self, FromByte, ParseResult};
use crate::tagged_fields::TaggedFields;

pub fn string(flexible: bool) -> impl Fn(NomBytes) -> ParseResult<String> {
    move |s| {
        if flexible {
            parser::parse_compact_string(s)
        } else {
            parser::parse_string(s)
        }
    }
}

pub fn nullable_string(flexible: bool) -> impl Fn(NomBytes) -> ParseResult<Option<String>> {
    move |s| {
        if flexible {
            parser::parse_compact_nullable_string(s)
        } else {
            parser::parse_nullable_string(s)
        }
    }
}

pub fn nullable_bytes(flexible: bool) -> impl Fn(NomBytes) -> ParseResult<Option<Bytes>> {
    move |s| {
        if flexible {
            parser::parse_compact_nullable_bytes(s)
        } else {
            parser::parse_nullable_bytes(s)
        }
    }
}

fn array_length(flexible: bool, s: NomBytes) -> ParseResult<Option<usize>> {
    if flexible {
        parser::parse_compact_array_length(s)
    } else {
        parser::parse_array_length(s)
    }
}

/// Array where null reads as empty.
pub fn array<O, F>(flexible: bool, mut f: F) -> impl FnMut(NomBytes) -> ParseResult<Vec<O>>
where
    F: Parser<NomBytes, O, Error>,
{
    move |s: NomBytes| {
        let (s, length) = array_length(flexible, s)?;
        match length {
            None => Ok((s, vec![])),
            Some(length) => parser::parse_elements(&mut f, s, length),
        }
    }
}

pub fn nullable_array<O, F>(
    flexible: bool,
    mut f: F,
) -> impl FnMut(NomBytes) -> ParseResult<Option<Vec<O>>>
where
    F: Parser<NomBytes, O, Error>,
{
    move |s: NomBytes| {
        let (s, length) = array_length(flexible, s)?;
        match length {
            None => Ok((s, None)),
            Some(length) => {
                let (s, v) = parser::parse_elements(&mut f, s, length)?;
                Ok((s, Some(v)))
            }
        }
    }
}

pub fn i32_array(flexible: bool) -> impl FnMut(NomBytes) -> ParseResult<Vec<i32>> {
    array(flexible, parser::parse_i32)
}

/// Tag buffer of a flexible version, nothing otherwise.
pub fn tagged_fields(flexible: bool) -> impl Fn(NomBytes) -> ParseResult<TaggedFields> {
    move |s| {
        if flexible {
            TaggedFields::decode(s)
        } else {
            Ok((s, TaggedFields::default()))
        }
    }
}

pub fn put_string<E: PacketEncoder>(pe: &mut E, flexible: bool, value: &str) -> Result<()> {
    if flexible {
        pe.put_compact_string(value)
    } else {
        pe.put_string(value)
    }
}

pub fn put_nullable_string<E: PacketEncoder>(
    pe: &mut E,
    flexible: bool,
    value: Option<&str>,
) -> Result<()> {
    if flexible {
        pe.put_compact_nullable_string(value)
    } else {
        pe.put_nullable_string(value)
    }
}

pub fn put_nullable_bytes<E: PacketEncoder>(
    pe: &mut E,
    flexible: bool,
    value: Option<&[u8]>,
) -> Result<()> {
    if flexible {
        pe.put_compact_nullable_bytes(value)
    } else {
        pe.put_nullable_bytes(value)
    }
}

pub fn put_array<E, T, F>(pe: &mut E, flexible: bool, xs: &[T], f: F) -> Result<()>
where
    E: PacketEncoder,
    F: FnMut(&mut E, &T) -> Result<()>,
{
    if flexible {
        encode::encode_as_compact_array(pe, xs, f)
    } else {
        encode::encode_as_array(pe, xs, f)
    }
}

pub fn put_nullable_array<E, T, F>(pe: &mut E, flexible: bool, xs: Option<&[T]>, f: F) -> Result<()>
where
    E: PacketEncoder,
    F: FnMut(&mut E, &T) -> Result<()>,
{
    if flexible {
        encode::encode_as_compact_nullable_array(pe, xs, f)
    } else {
        encode::encode_as_nullable_array(pe, xs, f)
    }
}

pub fn put_i32_array<E: PacketEncoder>(pe: &mut E, flexible: bool, xs: &[i32]) -> Result<()> {
    put_array(pe, flexible, xs, |pe, x| {
        pe.put_i32(*x);
        Ok(())
    })
}

pub fn put_tagged_fields<E: PacketEncoder>(
    pe: &mut E,
    flexible: bool,
    fields: &TaggedFields,
) -> Result<()> {
    if flexible {
        fields.encode(pe)
    } else {
        Ok(())
    }
}
