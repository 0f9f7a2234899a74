//! Serialize data into the bytecode protocol.
//!
//! Encoding runs twice over the same value: a [`PrepEncoder`] pass that only
//! counts bytes, then a [`RealEncoder`] pass that writes into a buffer sized
//! from that count. Every composite primitive (strings, bytes, array and
//! compact lengths) is a provided method of [`PacketEncoder`], so both passes
//! go through the same code and agree on every field's length. Only the
//! fixed-width integers, raw bytes and the unsigned varint differ between the
//! two encoders.
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::tagged_fields::TaggedFields;

pub type Uuid = [u8; 16];

// Helper macro to safely convert an usize expression into a signed
// integer.  If the conversion is not possible the macro issues a
// `PacketEncoding` error, otherwise returns the expression
// in the requested target type.
macro_rules! try_usize_to_int {
    ($value:expr, $ttype:ident) => {{
        let maxv = $ttype::MAX;
        let x: usize = $value;
        if (x as u64) <= (maxv as u64) {
            x as $ttype
        } else {
            return Err(Error::PacketEncoding(format!(
                "length {} exceeds {}",
                x,
                stringify!($ttype)
            )));
        }
    }};
}

/// Number of bytes `value` takes as an unsigned varint.
pub fn uvarint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Zigzag mapping used by signed varints.
pub fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Sink for the wire primitives.
pub trait PacketEncoder {
    fn put_i8(&mut self, value: i8);
    fn put_i16(&mut self, value: i16);
    fn put_i32(&mut self, value: i32);
    fn put_i64(&mut self, value: i64);
    fn put_uvarint(&mut self, value: u64);
    /// Raw bytes, no length prefix.
    fn put_raw_bytes(&mut self, value: &[u8]);

    /// Signed varint, zigzag encoded.
    fn put_varint(&mut self, value: i64) {
        self.put_uvarint(zigzag(value))
    }

    fn put_bool(&mut self, value: bool) {
        self.put_i8(value as i8)
    }

    fn put_uuid(&mut self, value: &Uuid) {
        self.put_raw_bytes(value)
    }

    fn put_string(&mut self, value: &str) -> Result<()> {
        let l = try_usize_to_int!(value.len(), i16);
        self.put_i16(l);
        self.put_raw_bytes(value.as_bytes());
        Ok(())
    }

    fn put_nullable_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.put_string(value),
            None => {
                self.put_i16(-1);
                Ok(())
            }
        }
    }

    fn put_compact_string(&mut self, value: &str) -> Result<()> {
        try_usize_to_int!(value.len(), i16);
        self.put_uvarint(value.len() as u64 + 1);
        self.put_raw_bytes(value.as_bytes());
        Ok(())
    }

    fn put_compact_nullable_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.put_compact_string(value),
            None => {
                self.put_uvarint(0);
                Ok(())
            }
        }
    }

    fn put_bytes(&mut self, value: &[u8]) -> Result<()> {
        let l = try_usize_to_int!(value.len(), i32);
        self.put_i32(l);
        self.put_raw_bytes(value);
        Ok(())
    }

    fn put_nullable_bytes(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            Some(value) => self.put_bytes(value),
            None => {
                self.put_i32(-1);
                Ok(())
            }
        }
    }

    fn put_compact_bytes(&mut self, value: &[u8]) -> Result<()> {
        try_usize_to_int!(value.len(), i32);
        self.put_uvarint(value.len() as u64 + 1);
        self.put_raw_bytes(value);
        Ok(())
    }

    fn put_compact_nullable_bytes(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            Some(value) => self.put_compact_bytes(value),
            None => {
                self.put_uvarint(0);
                Ok(())
            }
        }
    }

    fn put_array_length(&mut self, len: usize) -> Result<()> {
        let l = try_usize_to_int!(len, i32);
        self.put_i32(l);
        Ok(())
    }

    fn put_compact_array_length(&mut self, len: usize) -> Result<()> {
        try_usize_to_int!(len, i32);
        self.put_uvarint(len as u64 + 1);
        Ok(())
    }
}

/// Length-only encoder used to size the real buffer.
#[derive(Debug, Default)]
pub struct PrepEncoder {
    length: usize,
}

impl PrepEncoder {
    pub fn length(&self) -> usize {
        self.length
    }
}

impl PacketEncoder for PrepEncoder {
    fn put_i8(&mut self, _value: i8) {
        self.length += 1;
    }

    fn put_i16(&mut self, _value: i16) {
        self.length += 2;
    }

    fn put_i32(&mut self, _value: i32) {
        self.length += 4;
    }

    fn put_i64(&mut self, _value: i64) {
        self.length += 8;
    }

    fn put_uvarint(&mut self, value: u64) {
        self.length += uvarint_len(value);
    }

    fn put_raw_bytes(&mut self, value: &[u8]) {
        self.length += value.len();
    }
}

/// Byte-writing encoder over a buffer sized by the prepass.
#[derive(Debug, Default)]
pub struct RealEncoder {
    buf: BytesMut,
}

impl RealEncoder {
    pub fn with_capacity(capacity: usize) -> Self {
        RealEncoder {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> BytesMut {
        self.buf
    }
}

impl PacketEncoder for RealEncoder {
    fn put_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    fn put_i16(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    fn put_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    fn put_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    fn put_uvarint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.put_u8((value as u8) | 0x80);
            value >>= 7;
        }
        self.buf.put_u8(value as u8);
    }

    fn put_raw_bytes(&mut self, value: &[u8]) {
        self.buf.put_slice(value);
    }
}

pub trait ToByte {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()>;
}

impl<'a, T: ToByte + 'a + ?Sized> ToByte for &'a T {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        (*self).encode(pe)
    }
}

impl ToByte for bool {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_bool(*self);
        Ok(())
    }
}

impl ToByte for i8 {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_i8(*self);
        Ok(())
    }
}

impl ToByte for i16 {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_i16(*self);
        Ok(())
    }
}

impl ToByte for i32 {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_i32(*self);
        Ok(())
    }
}

impl ToByte for i64 {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_i64(*self);
        Ok(())
    }
}

impl ToByte for str {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_string(self)
    }
}

impl ToByte for String {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_string(self)
    }
}

impl<V: ToByte> ToByte for [V] {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        encode_as_array(pe, self, |pe, x| x.encode(pe))
    }
}

impl ToByte for [u8] {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_bytes(self)
    }
}

impl ToByte for Option<&str> {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_nullable_string(*self)
    }
}

impl ToByte for Option<String> {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_nullable_string(self.as_deref())
    }
}

impl ToByte for Option<Bytes> {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        pe.put_nullable_bytes(self.as_deref())
    }
}

// ~ this allows to render a slice of various types (typically &str
// and String) as strings
pub struct AsStrings<'a, T>(pub &'a [T]);

impl<'a, T: AsRef<str> + 'a> ToByte for AsStrings<'a, T> {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        encode_as_array(pe, self.0, |pe, x| pe.put_string(x.as_ref()))
    }
}

/// Same as [`AsStrings`] with compact lengths.
pub struct AsCompactStrings<'a, T>(pub &'a [T]);

impl<'a, T: AsRef<str> + 'a> ToByte for AsCompactStrings<'a, T> {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        encode_as_compact_array(pe, self.0, |pe, x| pe.put_compact_string(x.as_ref()))
    }
}

/// ~ Renders the length of `xs` to `pe` as the start of a
/// protocol array and then for each element of `xs` invokes `f`
/// assuming that function will render the element to the encoder.
pub fn encode_as_array<T, F, E>(pe: &mut E, xs: &[T], mut f: F) -> Result<()>
where
    F: FnMut(&mut E, &T) -> Result<()>,
    E: PacketEncoder,
{
    pe.put_array_length(xs.len())?;
    for x in xs {
        f(pe, x)?;
    }
    Ok(())
}

/// Like [`encode_as_array`], writing `-1` for a missing array.
pub fn encode_as_nullable_array<T, F, E>(pe: &mut E, xs: Option<&[T]>, f: F) -> Result<()>
where
    F: FnMut(&mut E, &T) -> Result<()>,
    E: PacketEncoder,
{
    match xs {
        Some(xs) => encode_as_array(pe, xs, f),
        None => {
            pe.put_i32(-1);
            Ok(())
        }
    }
}

pub fn encode_as_compact_array<T, F, E>(pe: &mut E, xs: &[T], mut f: F) -> Result<()>
where
    F: FnMut(&mut E, &T) -> Result<()>,
    E: PacketEncoder,
{
    pe.put_compact_array_length(xs.len())?;
    for x in xs {
        f(pe, x)?;
    }
    Ok(())
}

/// Like [`encode_as_compact_array`], writing `0` for a missing array.
pub fn encode_as_compact_nullable_array<T, F, E>(pe: &mut E, xs: Option<&[T]>, f: F) -> Result<()>
where
    F: FnMut(&mut E, &T) -> Result<()>,
    E: PacketEncoder,
{
    match xs {
        Some(xs) => encode_as_compact_array(pe, xs, f),
        None => {
            pe.put_uvarint(0);
            Ok(())
        }
    }
}

/// Classic `i32` array, `-1` for `None`.
pub fn encode_i32_array<E: PacketEncoder>(pe: &mut E, xs: Option<&[i32]>) -> Result<()> {
    encode_as_nullable_array(pe, xs, |pe, x| {
        pe.put_i32(*x);
        Ok(())
    })
}

pub fn encode_i64_array<E: PacketEncoder>(pe: &mut E, xs: Option<&[i64]>) -> Result<()> {
    encode_as_nullable_array(pe, xs, |pe, x| {
        pe.put_i64(*x);
        Ok(())
    })
}

pub fn encode_string_array<E: PacketEncoder, S: AsRef<str>>(
    pe: &mut E,
    xs: Option<&[S]>,
) -> Result<()> {
    encode_as_nullable_array(pe, xs, |pe, x| pe.put_string(x.as_ref()))
}

pub fn encode_compact_i32_array<E: PacketEncoder>(pe: &mut E, xs: &[i32]) -> Result<()> {
    encode_as_compact_array(pe, xs, |pe, x| {
        pe.put_i32(*x);
        Ok(())
    })
}

/// Tagged fields epilogue of a flexible struct.
pub fn encode_tagged_fields<E: PacketEncoder>(pe: &mut E, fields: &TaggedFields) -> Result<()> {
    fields.encode(pe)
}

/// Encode `value` into a freshly allocated buffer of exactly the size the
/// prepass computed.
pub fn encode<T: ToByte + ?Sized>(value: &T) -> Result<Bytes> {
    let mut prep = PrepEncoder::default();
    value.encode(&mut prep)?;

    let mut real = RealEncoder::with_capacity(prep.length());
    value.encode(&mut real)?;

    if real.len() != prep.length() {
        tracing::error!(
            "ERROR: prepass computed {} bytes but {} were written",
            prep.length(),
            real.len()
        );
        return Err(Error::PacketEncoding(format!(
            "prepass computed {} bytes but {} were written",
            prep.length(),
            real.len()
        )));
    }

    tracing::trace!("Encoded {} bytes", real.len());
    Ok(real.into_inner().freeze())
}

#[cfg(test)]
mod test {
    use super::*;

    fn real<T: ToByte + ?Sized>(value: &T) -> Vec<u8> {
        let mut pe = RealEncoder::default();
        value.encode(&mut pe).unwrap();
        pe.into_inner().to_vec()
    }

    #[test]
    fn test_string_too_long() {
        let s = "a".repeat(i16::MAX as usize + 1);
        let mut pe = RealEncoder::default();
        match s.encode(&mut pe) {
            Err(Error::PacketEncoding(_)) => {}
            _ => panic!(),
        }
        assert!(pe.is_empty());
    }

    #[test]
    fn test_compact_string_too_long() {
        let s = "a".repeat(i16::MAX as usize + 1);
        let mut pe = PrepEncoder::default();
        assert!(matches!(
            pe.put_compact_string(&s),
            Err(Error::PacketEncoding(_))
        ));
    }

    #[test]
    fn codec_i8() {
        assert_eq!(real(&5i8), [5]);
    }

    #[test]
    fn codec_i16() {
        assert_eq!(real(&5i16), [0, 5]);
    }

    #[test]
    fn codec_32() {
        assert_eq!(real(&5i32), [0, 0, 0, 5]);
    }

    #[test]
    fn codec_i64() {
        assert_eq!(real(&5i64), [0, 0, 0, 0, 0, 0, 0, 5]);
    }

    #[test]
    fn codec_string() {
        assert_eq!(real(&"test".to_owned()), [0, 4, 116, 101, 115, 116]);
    }

    #[test]
    fn codec_nullable_string() {
        assert_eq!(real(&Option::<&str>::None), [255, 255]);
        assert_eq!(real(&Some("a")), [0, 1, b'a']);
    }

    #[test]
    fn codec_vec_u8() {
        let orig: Vec<u8> = vec![1, 2, 3];
        assert_eq!(real(orig.as_slice()), [0, 0, 0, 3, 1, 2, 3]);
    }

    #[test]
    fn codec_as_strings() {
        let expected = [0, 0, 0, 2, 0, 3, b'a', b'b', b'c', 0, 4, b'd', b'e', b'f', b'g'];

        let orig: &[&str] = &["abc", "defg"];
        assert_eq!(real(&AsStrings(orig)), expected);

        let orig: Vec<String> = vec!["abc".to_owned(), "defg".to_owned()];
        assert_eq!(real(&AsStrings(&orig)), expected);
    }

    #[test]
    fn codec_compact() {
        let mut pe = RealEncoder::default();
        pe.put_compact_string("ab").unwrap();
        pe.put_compact_nullable_string(None).unwrap();
        pe.put_compact_nullable_bytes(Some(&[])).unwrap();
        pe.put_compact_array_length(0).unwrap();
        assert_eq!(pe.into_inner().to_vec(), [3, b'a', b'b', 0, 1, 1]);
    }

    #[test]
    fn null_arrays() {
        let mut pe = RealEncoder::default();
        encode_i32_array(&mut pe, None).unwrap();
        encode_i32_array(&mut pe, Some(&[])).unwrap();
        assert_eq!(pe.into_inner().to_vec(), [255, 255, 255, 255, 0, 0, 0, 0]);
    }

    #[test]
    fn uvarint_encoding() {
        let cases: [(u64, &[u8]); 5] = [
            (0, &[0]),
            (127, &[0x7f]),
            (128, &[0x80, 0x01]),
            (300, &[0xac, 0x02]),
            (16384, &[0x80, 0x80, 0x01]),
        ];
        for (value, expected) in cases {
            let mut pe = RealEncoder::default();
            pe.put_uvarint(value);
            assert_eq!(pe.into_inner().to_vec(), expected);
            assert_eq!(uvarint_len(value), expected.len());
        }
    }

    #[test]
    fn prepass_agrees_with_real_for_varints() {
        let values = [
            0i64,
            1,
            -1,
            63,
            -64,
            64,
            -65,
            8191,
            -8192,
            i32::MAX as i64,
            i32::MIN as i64,
            i64::MAX,
            i64::MIN,
        ];
        for value in values {
            let mut prep = PrepEncoder::default();
            let mut real = RealEncoder::default();
            prep.put_varint(value);
            real.put_varint(value);
            assert_eq!(prep.length(), real.len(), "varint {}", value);

            let mut prep = PrepEncoder::default();
            let mut real = RealEncoder::default();
            prep.put_uvarint(value as u64);
            real.put_uvarint(value as u64);
            assert_eq!(prep.length(), real.len(), "uvarint {}", value as u64);
        }
    }

    #[test]
    fn zigzag_values() {
        assert_eq!(zigzag(0), 0);
        assert_eq!(zigzag(-1), 1);
        assert_eq!(zigzag(1), 2);
        assert_eq!(zigzag(-2), 3);
        assert_eq!(zigzag(i64::MIN), u64::MAX);
    }

    #[test]
    fn encode_sizes_buffer_exactly() {
        let strings = vec!["abc".to_string(), "".to_string()];
        let buf = encode(&AsStrings(&strings)).unwrap();
        assert_eq!(buf.len(), 4 + 2 + 3 + 2);
    }
}
