//! Request and response envelopes.
//!
//! ### Protocol Def
//! ```text
//! Request Header v1 => request_api_key request_api_version correlation_id client_id
//!   request_api_key => INT16
//!   request_api_version => INT16
//!   correlation_id => INT32
//!   client_id => NULLABLE_STRING
//!
//! Request Header v2 => request_api_key request_api_version correlation_id client_id TAG_BUFFER
//!
//! Response Header v0 => correlation_id
//! Response Header v1 => correlation_id TAG_BUFFER
//! ```
//!
//! Every frame starts with an `INT32` length counting the bytes after it.
//! The client id keeps its classic encoding even in header v2.

use bytes::Bytes;
use nom::InputLength;
use nombytes::NomBytes;

use crate::{
    encode::{PacketEncoder, PrepEncoder, ToByte},
    error::{Error, Result},
    parser::{
        parse_all, parse_i16, parse_i32, parse_nullable_string, Decoder, FromByte, ParseResult,
    },
    protocol::{
        ProtocolBody, RequestBody, RequestFactory, RequestTypeFactory, TopicsAndGroups, Versioned,
    },
    tagged_fields::TaggedFields,
};

/// The first eight bytes of every request frame, enough to route it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestKeyVersion {
    /// Size of the frame after the length field.
    pub length: i32,
    pub api_key: i16,
    pub api_version: i16,
}

impl RequestKeyVersion {
    pub const SIZE: usize = 8;

    /// Peek at the front of a frame. Only the first [`Self::SIZE`] bytes are
    /// looked at.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::InsufficientData);
        }
        parse_all(
            <Self as FromByte>::decode,
            Bytes::copy_from_slice(&buf[..Self::SIZE]),
        )
    }

    /// 2 when the request uses the flexible header, 1 otherwise.
    pub fn request_header_version(&self) -> Result<i16> {
        let flexible = RequestTypeFactory::flexible_version(self.api_key, self.api_version)?;
        if self.api_version >= flexible {
            Ok(2)
        } else {
            Ok(1)
        }
    }

    /// Header version of the response to this request.
    pub fn response_header_version(&self) -> Result<i16> {
        Ok(self.request_header_version()? - 1)
    }
}

impl FromByte for RequestKeyVersion {
    fn decode(s: NomBytes) -> ParseResult<Self> {
        let (s, length) = parse_i32(s)?;
        if length <= 4 {
            return Err(nom::Err::Failure(Error::PacketDecoding(format!(
                "invalid request length {}",
                length
            ))));
        }
        let (s, api_key) = parse_i16(s)?;
        let (s, api_version) = parse_i16(s)?;
        Ok((
            s,
            RequestKeyVersion {
                length,
                api_key,
                api_version,
            },
        ))
    }
}

/// A request with a version 1 header.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub correlation_id: i32,
    pub client_id: Option<String>,
    pub body: RequestBody,
}

/// A request with a version 2 (flexible) header.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestV2 {
    pub correlation_id: i32,
    pub client_id: Option<String>,
    pub tagged_fields: TaggedFields,
    pub body: RequestBody,
}

struct Frame {
    correlation_id: i32,
    client_id: Option<String>,
    tagged_fields: TaggedFields,
    body: RequestBody,
}

fn parse_frame(s: NomBytes, flexible_header: bool) -> ParseResult<Frame> {
    let (s, key_version) = <RequestKeyVersion as FromByte>::decode(s)?;
    let remaining = s.input_len() + 4;
    if key_version.length as usize != remaining {
        return Err(nom::Err::Failure(Error::PacketDecoding(format!(
            "frame length {} does not match the {} bytes received",
            key_version.length, remaining
        ))));
    }

    let (s, correlation_id) = parse_i32(s)?;
    let (s, client_id) = parse_nullable_string(s)?;
    let (s, tagged_fields) = if flexible_header {
        TaggedFields::decode(s)?
    } else {
        (s, TaggedFields::default())
    };

    let mut body = RequestTypeFactory
        .produce(&key_version)
        .map_err(nom::Err::Failure)?;
    let (s, ()) = body.decode_from(s)?;

    if body.key() != key_version.api_key || body.version() != key_version.api_version {
        return Err(nom::Err::Failure(Error::PacketDecoding(format!(
            "body decoded as key {} version {} but the frame says key {} version {}",
            body.key(),
            body.version(),
            key_version.api_key,
            key_version.api_version
        ))));
    }

    Ok((
        s,
        Frame {
            correlation_id,
            client_id,
            tagged_fields,
            body,
        },
    ))
}

fn decode_frame(buf: Bytes, flexible_header: bool) -> Result<Frame> {
    tracing::trace!("Decoding request frame of {} bytes", buf.len());
    parse_all(|s| parse_frame(s, flexible_header), buf).map_err(|err| {
        tracing::error!("ERROR: Failed to decode request: {}", err);
        err
    })
}

fn encode_frame<E: PacketEncoder>(
    pe: &mut E,
    correlation_id: i32,
    client_id: Option<&str>,
    tagged_fields: Option<&TaggedFields>,
    body: &RequestBody,
) -> Result<()> {
    let mut prep = PrepEncoder::default();
    encode_after_length(&mut prep, correlation_id, client_id, tagged_fields, body)?;
    let length = i32::try_from(prep.length())
        .map_err(|_| Error::PacketEncoding(format!("frame of {} bytes", prep.length())))?;
    pe.put_i32(length);
    encode_after_length(pe, correlation_id, client_id, tagged_fields, body)
}

fn encode_after_length<E: PacketEncoder>(
    pe: &mut E,
    correlation_id: i32,
    client_id: Option<&str>,
    tagged_fields: Option<&TaggedFields>,
    body: &RequestBody,
) -> Result<()> {
    pe.put_i16(body.key());
    pe.put_i16(body.version());
    pe.put_i32(correlation_id);
    pe.put_nullable_string(client_id)?;
    if let Some(tagged_fields) = tagged_fields {
        tagged_fields.encode(pe)?;
    }
    body.encode(pe)
}

impl Request {
    /// Decode a whole frame, length prefix included.
    pub fn decode(buf: Bytes) -> Result<Self> {
        let frame = decode_frame(buf, false)?;
        Ok(Request {
            correlation_id: frame.correlation_id,
            client_id: frame.client_id,
            body: frame.body,
        })
    }
}

impl RequestV2 {
    /// Decode a whole frame, length prefix included.
    pub fn decode(buf: Bytes) -> Result<Self> {
        let frame = decode_frame(buf, true)?;
        Ok(RequestV2 {
            correlation_id: frame.correlation_id,
            client_id: frame.client_id,
            tagged_fields: frame.tagged_fields,
            body: frame.body,
        })
    }
}

impl ToByte for Request {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        tracing::trace!("Encoding Request {:?}", self);
        encode_frame(
            pe,
            self.correlation_id,
            self.client_id.as_deref(),
            None,
            &self.body,
        )
    }
}

impl ToByte for RequestV2 {
    fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
        tracing::trace!("Encoding RequestV2 {:?}", self);
        encode_frame(
            pe,
            self.correlation_id,
            self.client_id.as_deref(),
            Some(&self.tagged_fields),
            &self.body,
        )
    }
}

impl TopicsAndGroups for Request {
    fn topics(&self) -> Vec<String> {
        self.body.topics()
    }

    fn consumer_groups(&self) -> Vec<String> {
        self.body.consumer_groups()
    }

    fn all_topics(&self) -> bool {
        self.body.all_topics()
    }
}

impl TopicsAndGroups for RequestV2 {
    fn topics(&self) -> Vec<String> {
        self.body.topics()
    }

    fn consumer_groups(&self) -> Vec<String> {
        self.body.consumer_groups()
    }

    fn all_topics(&self) -> bool {
        self.body.all_topics()
    }
}

/// Correlation id of a response, plus the tag buffer of version 1.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseHeader {
    pub correlation_id: i32,
    pub tagged_fields: TaggedFields,
}

impl Versioned for ResponseHeader {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, correlation_id) = parse_i32(s)?;
        let (s, tagged_fields) = if version >= 1 {
            TaggedFields::decode(s)?
        } else {
            (s, TaggedFields::default())
        };
        Ok((
            s,
            ResponseHeader {
                correlation_id,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        pe.put_i32(self.correlation_id);
        if version >= 1 {
            self.tagged_fields.encode(pe)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encode::encode;

    // Metadata v0 for the topic "rust", correlation id 1, client "rust"
    const METADATA_V0: [u8; 28] = [
        0, 0, 0, 24, 0, 3, 0, 0, 0, 0, 0, 1, 0, 4, 114, 117, 115, 116, 0, 0, 0, 1, 0, 4, 114,
        117, 115, 116,
    ];

    #[test]
    fn key_version() {
        let kv = RequestKeyVersion::decode(&METADATA_V0).unwrap();
        assert_eq!(
            kv,
            RequestKeyVersion {
                length: 24,
                api_key: 3,
                api_version: 0
            }
        );
        assert_eq!(kv.request_header_version().unwrap(), 1);
        assert_eq!(kv.response_header_version().unwrap(), 0);

        assert_eq!(
            RequestKeyVersion::decode(&METADATA_V0[..7]),
            Err(Error::InsufficientData)
        );
    }

    #[test]
    fn key_version_rejects_short_length() {
        for length in [i32::MIN, -1, 0, 4] {
            let mut buf = length.to_be_bytes().to_vec();
            buf.extend_from_slice(&[0, 3, 0, 0]);
            assert!(matches!(
                RequestKeyVersion::decode(&buf),
                Err(Error::PacketDecoding(_))
            ));
        }
        let mut buf = 5i32.to_be_bytes().to_vec();
        buf.extend_from_slice(&[0, 3, 0, 0]);
        assert!(RequestKeyVersion::decode(&buf).is_ok());
    }

    #[test]
    fn header_versions() {
        let flexible = RequestKeyVersion {
            length: 10,
            api_key: 3,
            api_version: 9,
        };
        assert_eq!(flexible.request_header_version().unwrap(), 2);
        assert_eq!(flexible.response_header_version().unwrap(), 1);

        let unsupported = RequestKeyVersion {
            length: 10,
            api_key: 3,
            api_version: 13,
        };
        assert!(unsupported.request_header_version().is_err());
    }

    #[test]
    fn decode_request() {
        let req = Request::decode(Bytes::from_static(&METADATA_V0)).unwrap();
        assert_eq!(req.correlation_id, 1);
        assert_eq!(req.client_id.as_deref(), Some("rust"));
        assert_eq!(req.body.key(), 3);
        assert_eq!(req.topics(), vec!["rust".to_string()]);
        assert_eq!(encode(&req).unwrap().as_ref(), METADATA_V0);
    }

    #[test]
    fn length_must_match() {
        let mut buf = METADATA_V0.to_vec();
        buf[3] = 25;
        assert!(Request::decode(Bytes::from(buf)).is_err());

        let mut buf = METADATA_V0.to_vec();
        buf.push(0);
        assert!(Request::decode(Bytes::from(buf)).is_err());
    }

    #[test]
    fn decode_request_v2() {
        let buf = [
            0, 0, 0, 17, // length
            0, 3, 0, 9, // metadata v9
            0, 0, 0, 7, // correlation_id
            255, 255, // null client_id
            0, // header tags
            2, 2, b'a', 0, // topics
            1, 0, 0, 0, // flags and tags
        ];
        let req = RequestV2::decode(Bytes::copy_from_slice(&buf)).unwrap_err();
        // the declared length covers the key/version but not the last bytes
        assert!(matches!(req, Error::PacketDecoding(_)));

        let mut fixed = buf.to_vec();
        fixed[3] = (buf.len() - 4) as u8;
        let req = RequestV2::decode(Bytes::from(fixed.clone())).unwrap();
        assert_eq!(req.correlation_id, 7);
        assert_eq!(req.client_id, None);
        assert_eq!(req.topics(), vec!["a".to_string()]);
        assert_eq!(encode(&req).unwrap().as_ref(), fixed.as_slice());
    }

    #[test]
    fn unsupported_key() {
        // FindCoordinator is not inspected
        let buf = [0, 0, 0, 10, 0, 10, 0, 0, 0, 0, 0, 1, 255, 255];
        assert_eq!(
            Request::decode(Bytes::copy_from_slice(&buf)),
            Err(Error::UnsupportedApiKey(10))
        );
    }

    #[test]
    fn response_header() {
        let (_, v0) = ResponseHeader::parse_version(NomBytes::from(&[0u8, 0, 0, 9][..]), 0).unwrap();
        assert_eq!(v0.correlation_id, 9);

        let mut pe = crate::encode::RealEncoder::default();
        v0.encode_version(&mut pe, 1).unwrap();
        assert_eq!(pe.into_inner().as_ref(), [0, 0, 0, 9, 0]);
    }
}
