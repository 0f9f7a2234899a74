//! Crate & protocol level errors.
//!
//! Every failure in the codec is a returned [`Error`]; malformed or truncated
//! input never panics. The variants fall into a few groups:
//!
//! - [`Error::InsufficientData`]: the buffer ended before a declared length
//!   was satisfied.
//! - Packet decoding errors ([`Error::InvalidBool`],
//!   [`Error::InvalidArrayLength`], ..., [`Error::PacketDecoding`]): the bytes
//!   are present but do not form a valid primitive.
//! - [`Error::PacketEncoding`]: a value cannot be represented on the wire.
//! - [`Error::SchemaEncoding`] / [`Error::SchemaDecoding`]: a generic
//!   [`Struct`](crate::schema::Struct) does not agree with its schema.
//! - [`Error::UnsupportedApiKey`] / [`Error::UnsupportedApiVersion`]: no
//!   decoder or schema exists for the request or response.
//!
//! [`Error`] doubles as the nom error type for every parser in the crate.

use std::{io, result};

use nom::error::{ErrorKind, ParseError};
use nombytes::NomBytes;
use thiserror::Error as ThisError;

pub type Result<T> = result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum Error {
    /// The buffer is shorter than the lengths it declares.
    #[error("kafka: insufficient data to decode packet, more bytes expected")]
    InsufficientData,

    /// A bool byte other than 0 or 1.
    #[error("kafka: error decoding packet: invalid bool")]
    InvalidBool,

    /// An array length that is negative (other than the null marker) or
    /// beyond the sanity bound.
    #[error("kafka: error decoding packet: invalid array length {0}")]
    InvalidArrayLength(i64),

    /// A string length that is negative where null is not permitted.
    #[error("kafka: error decoding packet: invalid string length {0}")]
    InvalidStringLength(i64),

    /// A byte slice length that is negative where null is not permitted.
    #[error("kafka: error decoding packet: invalid byteslice length {0}")]
    InvalidBytesLength(i64),

    /// A varint longer than its integer type allows.
    #[error("kafka: error decoding packet: varint overflow")]
    InvalidVarint,

    #[error("kafka: error decoding packet: invalid utf-8 string")]
    InvalidUtf8,

    #[error("kafka: error decoding packet: {0}")]
    PacketDecoding(String),

    #[error("kafka: error encoding packet: {0}")]
    PacketEncoding(String),

    #[error("schema: error encoding: {0}")]
    SchemaEncoding(String),

    #[error("schema: error decoding: {0}")]
    SchemaDecoding(String),

    #[error("unsupported api key {0}")]
    UnsupportedApiKey(i16),

    #[error("unsupported version {api_version} for api key {api_key}")]
    UnsupportedApiVersion { api_key: i16, api_version: i16 },

    /// Raised by an address mapper that cannot map a broker endpoint.
    #[error("address mapping error: {0}")]
    AddressMapping(String),

    #[error("frame of {size} bytes exceeds the maximum of {max}")]
    FrameTooLarge { size: i64, max: usize },

    #[error("IO error: {0:?}")]
    IoError(io::ErrorKind),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the errors produced while decoding malformed wire bytes.
    pub fn is_decoding(&self) -> bool {
        matches!(
            self,
            Error::InsufficientData
                | Error::InvalidBool
                | Error::InvalidArrayLength(_)
                | Error::InvalidStringLength(_)
                | Error::InvalidBytesLength(_)
                | Error::InvalidVarint
                | Error::InvalidUtf8
                | Error::PacketDecoding(_)
                | Error::SchemaDecoding(_)
        )
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e.kind())
    }
}

impl From<nom::Err<Error>> for Error {
    fn from(e: nom::Err<Error>) -> Self {
        match e {
            nom::Err::Incomplete(_) => Error::InsufficientData,
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
        }
    }
}

// nom's complete parsers report a short buffer as `Eof`
impl ParseError<NomBytes> for Error {
    fn from_error_kind(_input: NomBytes, kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Eof | ErrorKind::Complete => Error::InsufficientData,
            kind => Error::PacketDecoding(kind.description().to_string()),
        }
    }

    fn append(_input: NomBytes, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn eof_is_insufficient_data() {
        let err = Error::from_error_kind(NomBytes::from(&b""[..]), ErrorKind::Eof);
        assert_eq!(err, Error::InsufficientData);
    }

    #[test]
    fn incomplete_is_insufficient_data() {
        let err: Error = nom::Err::Incomplete(nom::Needed::Unknown).into();
        assert_eq!(err, Error::InsufficientData);
    }

    #[test]
    fn failure_is_flattened() {
        let err: Error = nom::Err::Failure(Error::InvalidBool).into();
        assert_eq!(err, Error::InvalidBool);
    }

    #[test]
    fn display() {
        let err = Error::UnsupportedApiVersion {
            api_key: 2,
            api_version: 99,
        };
        assert_eq!(err.to_string(), "unsupported version 99 for api key 2");
        assert!(Error::InvalidBool.to_string().contains("invalid bool"));
    }

    #[test]
    fn io_error_kind() {
        let err: Error = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert_eq!(err, Error::IoError(io::ErrorKind::UnexpectedEof));
        assert!(!err.is_decoding());
    }
}
