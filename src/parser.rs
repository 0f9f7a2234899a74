//! Deserialize data from the bytecode protocol.
//!
//! Every parser here is a `nom` parser over [`NomBytes`] whose error type is
//! the crate [`Error`], so a failure already carries its place in the error
//! taxonomy. Lengths are validated before anything is allocated: a declared
//! length that is longer than the remaining input is reported as
//! [`Error::InsufficientData`], a negative one where null is not permitted
//! as the matching `Invalid*Length` error.
use bytes::Bytes;
use nom::{
    bytes::complete::take,
    number::complete::{be_i16, be_i32, be_i64, be_i8, be_u8},
    IResult, InputLength, Parser,
};
use nombytes::NomBytes;

use crate::encode::Uuid;
use crate::error::{Error, Result};

pub type ParseResult<T> = IResult<NomBytes, T, Error>;

/// Upper bound on a classic array count, checked before allocating.
pub const MAX_ARRAY_LENGTH: i64 = 2 * u16::MAX as i64;

fn failure<T>(e: Error) -> ParseResult<T> {
    Err(nom::Err::Failure(e))
}

pub fn parse_i8(s: NomBytes) -> ParseResult<i8> {
    be_i8(s)
}

pub fn parse_i16(s: NomBytes) -> ParseResult<i16> {
    be_i16(s)
}

pub fn parse_i32(s: NomBytes) -> ParseResult<i32> {
    be_i32(s)
}

pub fn parse_i64(s: NomBytes) -> ParseResult<i64> {
    be_i64(s)
}

pub fn parse_bool(s: NomBytes) -> ParseResult<bool> {
    let (s, byte) = be_u8(s)?;
    match byte {
        0 => Ok((s, false)),
        1 => Ok((s, true)),
        _ => failure(Error::InvalidBool),
    }
}

/// Unsigned base-128 varint, at most ten bytes.
pub fn parse_uvarint(s: NomBytes) -> ParseResult<u64> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    let mut remainder = s;
    loop {
        let (rest, byte) = be_u8(remainder)?;
        remainder = rest;
        if shift == 63 && byte > 1 {
            return failure(Error::InvalidVarint);
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok((remainder, value));
        }
        shift += 7;
    }
}

/// Signed zigzag varint.
pub fn parse_varint(s: NomBytes) -> ParseResult<i64> {
    let (s, n) = parse_uvarint(s)?;
    Ok((s, ((n >> 1) as i64) ^ -((n & 1) as i64)))
}

/// Unsigned varint that must fit a `u32`, as used for tags and sizes.
pub fn parse_uvarint32(s: NomBytes) -> ParseResult<u32> {
    let (s, n) = parse_uvarint(s)?;
    match u32::try_from(n) {
        Ok(n) => Ok((s, n)),
        Err(_) => failure(Error::InvalidVarint),
    }
}

pub fn parse_uuid(s: NomBytes) -> ParseResult<Uuid> {
    let (s, raw) = take(16usize)(s)?;
    let mut uuid = [0u8; 16];
    uuid.copy_from_slice(&raw.into_bytes());
    Ok((s, uuid))
}

/// Consume `n` bytes without looking at them.
pub fn skip_bytes(n: usize) -> impl FnMut(NomBytes) -> ParseResult<()> {
    move |s: NomBytes| {
        if n > s.input_len() {
            return failure(Error::InsufficientData);
        }
        let (s, _) = take(n)(s)?;
        Ok((s, ()))
    }
}

pub(crate) fn take_raw(s: NomBytes, length: usize) -> ParseResult<Bytes> {
    if length > s.input_len() {
        return failure(Error::InsufficientData);
    }
    let (s, raw) = take(length)(s)?;
    Ok((s, raw.into_bytes()))
}

fn take_string(s: NomBytes, length: usize) -> ParseResult<String> {
    let (s, raw) = take_raw(s, length)?;
    match std::str::from_utf8(&raw) {
        Ok(string) => Ok((s, string.to_owned())),
        Err(_) => failure(Error::InvalidUtf8),
    }
}

pub fn parse_string(s: NomBytes) -> ParseResult<String> {
    let (s, length) = be_i16(s)?;
    if length < 0 {
        return failure(Error::InvalidStringLength(length.into()));
    }
    take_string(s, length as usize)
}

pub fn parse_nullable_string(s: NomBytes) -> ParseResult<Option<String>> {
    let (s, length) = be_i16(s)?;
    match length {
        -1 => Ok((s, None)),
        n if n < 0 => failure(Error::InvalidStringLength(n.into())),
        n => {
            let (s, string) = take_string(s, n as usize)?;
            Ok((s, Some(string)))
        }
    }
}

pub fn parse_compact_string(s: NomBytes) -> ParseResult<String> {
    let (s, n) = parse_uvarint(s)?;
    if n == 0 {
        return failure(Error::InvalidStringLength(-1));
    }
    take_string(s, compact_length(n, Error::InvalidStringLength)?)
}

/// `0` is null, `1` is the empty string.
pub fn parse_compact_nullable_string(s: NomBytes) -> ParseResult<Option<String>> {
    let (s, n) = parse_uvarint(s)?;
    if n == 0 {
        return Ok((s, None));
    }
    let (s, string) = take_string(s, compact_length(n, Error::InvalidStringLength)?)?;
    Ok((s, Some(string)))
}

pub fn parse_bytes(s: NomBytes) -> ParseResult<Bytes> {
    let (s, length) = be_i32(s)?;
    if length < 0 {
        return failure(Error::InvalidBytesLength(length.into()));
    }
    take_raw(s, length as usize)
}

pub fn parse_nullable_bytes(s: NomBytes) -> ParseResult<Option<Bytes>> {
    let (s, length) = be_i32(s)?;
    match length {
        -1 => Ok((s, None)),
        n if n < 0 => failure(Error::InvalidBytesLength(n.into())),
        n => {
            let (s, bytes) = take_raw(s, n as usize)?;
            Ok((s, Some(bytes)))
        }
    }
}

pub fn parse_compact_bytes(s: NomBytes) -> ParseResult<Bytes> {
    let (s, n) = parse_uvarint(s)?;
    if n == 0 {
        return failure(Error::InvalidBytesLength(-1));
    }
    take_raw(s, compact_length(n, Error::InvalidBytesLength)?)
}

pub fn parse_compact_nullable_bytes(s: NomBytes) -> ParseResult<Option<Bytes>> {
    let (s, n) = parse_uvarint(s)?;
    if n == 0 {
        return Ok((s, None));
    }
    let (s, bytes) = take_raw(s, compact_length(n, Error::InvalidBytesLength)?)?;
    Ok((s, Some(bytes)))
}

// compact lengths are encoded as `len + 1`; callers have already handled 0
fn compact_length(n: u64, invalid: fn(i64) -> Error) -> std::result::Result<usize, nom::Err<Error>> {
    let length = n - 1;
    if length > i32::MAX as u64 {
        return Err(nom::Err::Failure(invalid(length as i64)));
    }
    Ok(length as usize)
}

fn check_array_length(s: &NomBytes, length: i64) -> std::result::Result<usize, nom::Err<Error>> {
    if !(0..=MAX_ARRAY_LENGTH).contains(&length) {
        return Err(nom::Err::Failure(Error::InvalidArrayLength(length)));
    }
    // every element takes at least one byte
    if length as usize > s.input_len() {
        return Err(nom::Err::Failure(Error::InsufficientData));
    }
    Ok(length as usize)
}

/// Classic array count: `-1` is `None`, distinct from an empty array.
pub fn parse_array_length(s: NomBytes) -> ParseResult<Option<usize>> {
    let (s, length) = be_i32(s)?;
    if length == -1 {
        return Ok((s, None));
    }
    let length = check_array_length(&s, length.into())?;
    Ok((s, Some(length)))
}

/// Compact array count: `0` is `None`, otherwise `len + 1`.
pub fn parse_compact_array_length(s: NomBytes) -> ParseResult<Option<usize>> {
    let (s, n) = parse_uvarint(s)?;
    if n == 0 {
        return Ok((s, None));
    }
    let length = match i64::try_from(n - 1) {
        Ok(length) => length,
        Err(_) => return failure(Error::InvalidArrayLength(-1)),
    };
    let length = check_array_length(&s, length)?;
    Ok((s, Some(length)))
}

pub(crate) fn parse_elements<O, F>(f: &mut F, s: NomBytes, length: usize) -> ParseResult<Vec<O>>
where
    F: Parser<NomBytes, O, Error>,
{
    let mut remainder = s;
    let mut out = Vec::with_capacity(length);
    for _ in 0..length {
        let (rest, o) = f.parse(remainder)?;
        remainder = rest;
        out.push(o);
    }
    Ok((remainder, out))
}

/// Classic array where a null array reads as empty.
pub fn parse_array<O, F>(mut f: F) -> impl FnMut(NomBytes) -> ParseResult<Vec<O>>
where
    F: Parser<NomBytes, O, Error>,
{
    move |s: NomBytes| {
        let (s, length) = parse_array_length(s)?;
        match length {
            None => Ok((s, vec![])),
            Some(length) => parse_elements(&mut f, s, length),
        }
    }
}

/// Classic array keeping `-1` as `None`.
pub fn parse_nullable_array<O, F>(mut f: F) -> impl FnMut(NomBytes) -> ParseResult<Option<Vec<O>>>
where
    F: Parser<NomBytes, O, Error>,
{
    move |s: NomBytes| {
        let (s, length) = parse_array_length(s)?;
        match length {
            None => Ok((s, None)),
            Some(length) => {
                let (s, v) = parse_elements(&mut f, s, length)?;
                Ok((s, Some(v)))
            }
        }
    }
}

/// Compact array where a null array reads as empty.
pub fn parse_compact_array<O, F>(mut f: F) -> impl FnMut(NomBytes) -> ParseResult<Vec<O>>
where
    F: Parser<NomBytes, O, Error>,
{
    move |s: NomBytes| {
        let (s, length) = parse_compact_array_length(s)?;
        match length {
            None => Ok((s, vec![])),
            Some(length) => parse_elements(&mut f, s, length),
        }
    }
}

pub fn parse_compact_nullable_array<O, F>(
    mut f: F,
) -> impl FnMut(NomBytes) -> ParseResult<Option<Vec<O>>>
where
    F: Parser<NomBytes, O, Error>,
{
    move |s: NomBytes| {
        let (s, length) = parse_compact_array_length(s)?;
        match length {
            None => Ok((s, None)),
            Some(length) => {
                let (s, v) = parse_elements(&mut f, s, length)?;
                Ok((s, Some(v)))
            }
        }
    }
}

pub fn parse_i32_array(s: NomBytes) -> ParseResult<Option<Vec<i32>>> {
    parse_nullable_array(parse_i32)(s)
}

pub fn parse_i64_array(s: NomBytes) -> ParseResult<Option<Vec<i64>>> {
    parse_nullable_array(parse_i64)(s)
}

pub fn parse_string_array(s: NomBytes) -> ParseResult<Option<Vec<String>>> {
    parse_nullable_array(parse_string)(s)
}

pub fn parse_compact_i32_array(s: NomBytes) -> ParseResult<Vec<i32>> {
    parse_compact_array(parse_i32)(s)
}

/// A type that can be read off the wire on its own.
pub trait FromByte: Sized {
    fn decode(s: NomBytes) -> ParseResult<Self>;
}

/// A target that fills itself from the wire. Request bodies selected by a
/// factory decode in place; everything implementing [`FromByte`] gets this
/// for free.
pub trait Decoder {
    fn decode_from(&mut self, s: NomBytes) -> ParseResult<()>;
}

macro_rules! from_byte {
    ($($ty:ty => $parser:ident),* $(,)?) => {$(
        impl FromByte for $ty {
            fn decode(s: NomBytes) -> ParseResult<Self> {
                $parser(s)
            }
        }
    )*};
}

from_byte! {
    bool => parse_bool,
    i8 => parse_i8,
    i16 => parse_i16,
    i32 => parse_i32,
    i64 => parse_i64,
    String => parse_string,
}

impl<T: FromByte> Decoder for T {
    fn decode_from(&mut self, s: NomBytes) -> ParseResult<()> {
        let (s, value) = T::decode(s)?;
        *self = value;
        Ok((s, ()))
    }
}

/// Decode `buf` into `target`, failing if any byte is left over.
pub fn decode<D: Decoder + ?Sized>(buf: Bytes, target: &mut D) -> Result<()> {
    tracing::trace!("Decoding {} bytes", buf.len());
    let (rest, ()) = target.decode_from(NomBytes::new(buf))?;
    let remaining = rest.input_len();
    if remaining != 0 {
        return Err(Error::PacketDecoding(format!(
            "invalid length: {} bytes remaining",
            remaining
        )));
    }
    Ok(())
}

/// Run a parser over a complete buffer, failing on leftover bytes.
pub fn parse_all<O, F>(mut f: F, buf: Bytes) -> Result<O>
where
    F: Parser<NomBytes, O, Error>,
{
    let (rest, o) = f.parse(NomBytes::new(buf))?;
    let remaining = rest.input_len();
    if remaining != 0 {
        return Err(Error::PacketDecoding(format!(
            "invalid length: {} bytes remaining",
            remaining
        )));
    }
    Ok(o)
}

#[cfg(test)]
mod test {
    use super::*;

    fn nb(b: &[u8]) -> NomBytes {
        NomBytes::from(b)
    }

    fn err<T: std::fmt::Debug>(r: ParseResult<T>) -> Error {
        Error::from(r.unwrap_err())
    }

    #[test]
    fn parse_uvarint_simple() {
        assert_eq!(
            parse_uvarint(nb(b"\x0b\x01\x02\x03")),
            Ok((nb(b"\x01\x02\x03"), 11))
        );
    }

    #[test]
    fn parse_uvarint_twobyte() {
        assert_eq!(
            parse_uvarint(nb(b"\x84\x02\x04\x05\x06")),
            Ok((nb(b"\x04\x05\x06"), 260))
        );
    }

    #[test]
    fn parse_varlong() {
        assert_eq!(
            parse_uvarint(nb(b"\xff\xff\xff\xff\xff\xff\xff\xff\x7f\x04\x05\x06")),
            Ok((nb(b"\x04\x05\x06"), 9223372036854775807))
        );
    }

    #[test]
    fn parse_uvarint_overflow() {
        let buf = [0xffu8; 11];
        assert_eq!(err(parse_uvarint(nb(&buf))), Error::InvalidVarint);
    }

    #[test]
    fn parse_uvarint_truncated() {
        assert_eq!(err(parse_uvarint(nb(b"\x80\x80"))), Error::InsufficientData);
    }

    #[test]
    fn parse_varint_zigzag() {
        assert_eq!(parse_varint(nb(b"\x01")).unwrap().1, -1);
        assert_eq!(parse_varint(nb(b"\x02")).unwrap().1, 1);
        assert_eq!(parse_varint(nb(b"\x03")).unwrap().1, -2);
    }

    #[test]
    fn test_parse_bool() {
        assert!(!parse_bool(nb(b"\x00")).unwrap().1);
        assert!(parse_bool(nb(b"\x01")).unwrap().1);
        assert_eq!(err(parse_bool(nb(b"\x02"))), Error::InvalidBool);
    }

    #[test]
    fn test_parse_string() {
        let buf = nb(b"\x00\x04\x72\x75\x73\x74");
        assert_eq!(parse_string(buf).unwrap().1, "rust");
    }

    #[test]
    fn test_parse_string_negative() {
        assert_eq!(
            err(parse_string(nb(b"\xff\xff"))),
            Error::InvalidStringLength(-1)
        );
    }

    #[test]
    fn test_parse_string_truncated() {
        assert_eq!(
            err(parse_string(nb(b"\x00\x05rust"))),
            Error::InsufficientData
        );
    }

    #[test]
    fn test_parse_string_utf8() {
        assert_eq!(
            err(parse_string(nb(b"\x00\x02\xc3\x28"))),
            Error::InvalidUtf8
        );
    }

    #[test]
    fn test_parse_nullable_string() {
        assert_eq!(parse_nullable_string(nb(b"\xff\xff")).unwrap().1, None);
        assert_eq!(
            parse_nullable_string(nb(b"\x00\x00")).unwrap().1,
            Some(String::new())
        );
        assert_eq!(
            err(parse_nullable_string(nb(b"\xff\xfe"))),
            Error::InvalidStringLength(-2)
        );
    }

    #[test]
    fn test_parse_compact_nullable_string() {
        assert_eq!(parse_compact_nullable_string(nb(b"\x00")).unwrap().1, None);
        assert_eq!(
            parse_compact_nullable_string(nb(b"\x01")).unwrap().1,
            Some(String::new())
        );
        assert_eq!(
            parse_compact_nullable_string(nb(b"\x03ab")).unwrap().1,
            Some("ab".to_string())
        );
    }

    #[test]
    fn test_parse_compact_string_rejects_null() {
        assert_eq!(
            err(parse_compact_string(nb(b"\x00"))),
            Error::InvalidStringLength(-1)
        );
    }

    #[test]
    fn test_parse_bytes() {
        assert_eq!(
            parse_bytes(nb(b"\x00\x00\x00\x02\x01\x02")).unwrap().1,
            Bytes::from_static(b"\x01\x02")
        );
        assert_eq!(
            parse_nullable_bytes(nb(b"\xff\xff\xff\xff")).unwrap().1,
            None
        );
        assert_eq!(
            err(parse_bytes(nb(b"\xff\xff\xff\xff"))),
            Error::InvalidBytesLength(-1)
        );
    }

    #[test]
    fn test_parse_array() {
        let buf = nb([
            0, 0, 0, 2, // array size
            0, 4, 114, 117, 115, 116, // string
            0, 4, 114, 117, 115, 116, // string
            0, 0, 0, // leftover input
        ]
        .as_slice());

        assert_eq!(
            parse_array(parse_string)(buf).unwrap().1,
            vec![String::from("rust"), String::from("rust")]
        );
    }

    #[test]
    fn test_nil_and_empty_arrays() {
        assert_eq!(parse_i32_array(nb(b"\xff\xff\xff\xff")).unwrap().1, None);
        assert_eq!(
            parse_i32_array(nb(b"\x00\x00\x00\x00")).unwrap().1,
            Some(vec![])
        );
        assert_eq!(
            parse_i64_array(nb(b"\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\x00\x07"))
                .unwrap()
                .1,
            Some(vec![7])
        );
    }

    #[test]
    fn test_array_bounds() {
        assert_eq!(
            err(parse_i32_array(nb(b"\xff\xff\xff\xfe"))),
            Error::InvalidArrayLength(-2)
        );
        assert_eq!(
            err(parse_i32_array(nb(b"\x7f\xff\xff\xff"))),
            Error::InvalidArrayLength(i32::MAX as i64)
        );
        // plausible count, but not enough bytes behind it
        assert_eq!(
            err(parse_i32_array(nb(b"\x00\x00\x10\x00\x00"))),
            Error::InsufficientData
        );
    }

    #[test]
    fn test_compact_array() {
        assert_eq!(
            parse_compact_nullable_array(parse_i8)(nb(b"\x00")).unwrap().1,
            None
        );
        assert_eq!(
            parse_compact_array(parse_i8)(nb(b"\x03\x01\x02")).unwrap().1,
            vec![1, 2]
        );
    }

    #[test]
    fn test_skip_bytes() {
        let (rest, ()) = skip_bytes(2)(nb(b"\x01\x02\x03")).unwrap();
        assert_eq!(rest, nb(b"\x03"));
        assert_eq!(err(skip_bytes(4)(nb(b"\x01"))), Error::InsufficientData);
    }

    #[test]
    fn test_decode_leftover() {
        let mut value = 0i32;
        let res = decode(Bytes::from_static(b"\x00\x00\x00\x01\x00"), &mut value);
        assert!(matches!(res, Err(Error::PacketDecoding(_))));
    }
}
