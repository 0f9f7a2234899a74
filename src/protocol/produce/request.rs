//! Decoding and encoding for Produce requests.
//!
//! ### Protocol Def
//! ```text
//! Produce Request (Version: 0-2) => acks timeout_ms [topic_data]
//!   acks => INT16
//!   timeout_ms => INT32
//!   topic_data => name [partition_data]
//!     name => STRING
//!     partition_data => index records
//!       index => INT32
//!       records => RECORDS
//!
//! Produce Request (Version: 3-8) => transactional_id acks timeout_ms [topic_data]
//!   transactional_id => NULLABLE_STRING
//!
//! Produce Request (Version: 9) => transactional_id acks timeout_ms [topic_data] TAG_BUFFER
//!   transactional_id => COMPACT_NULLABLE_STRING
//!   topic_data => name [partition_data] TAG_BUFFER
//!     name => COMPACT_STRING
//!     partition_data => index records TAG_BUFFER
//!       records => COMPACT_RECORDS
//! ```
//!
//! Record batches are kept as opaque byte ranges.

use bytes::Bytes;
use nombytes::NomBytes;

use crate::{
    encode::PacketEncoder,
    error::Result,
    parser::{parse_i16, parse_i32, ParseResult},
    protocol::{wire, ApiKey, TopicsAndGroups, Versioned},
    tagged_fields::TaggedFields,
};

pub const FLEXIBLE_VERSION: i16 = 9;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProduceRequest {
    /// The transactional ID, or null if the producer is not transactional.
    pub transactional_id: Option<String>,
    /// The number of acknowledgments the producer requires the leader to have received before considering a request complete. Allowed values: 0 for no acknowledgments, 1 for only the leader and -1 for the full ISR.
    pub acks: i16,
    /// The timeout to await a response in milliseconds.
    pub timeout_ms: i32,
    /// Each topic to produce to.
    pub topic_data: Vec<TopicProduceData>,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopicProduceData {
    /// The topic name.
    pub name: String,
    /// Each partition to produce to.
    pub partition_data: Vec<PartitionProduceData>,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartitionProduceData {
    /// The partition index.
    pub index: i32,
    /// The record data to be produced.
    pub records: Option<Bytes>,
    pub tagged_fields: TaggedFields,
}

impl Versioned for PartitionProduceData {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, index) = parse_i32(s)?;
        let (s, records) = wire::nullable_bytes(flexible)(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            PartitionProduceData {
                index,
                records,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        pe.put_i32(self.index);
        wire::put_nullable_bytes(pe, flexible, self.records.as_deref())?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for TopicProduceData {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, name) = wire::string(flexible)(s)?;
        let (s, partition_data) = wire::array(flexible, |s| {
            PartitionProduceData::parse_version(s, version)
        })(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            TopicProduceData {
                name,
                partition_data,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_string(pe, flexible, &self.name)?;
        wire::put_array(pe, flexible, &self.partition_data, |pe, p| {
            p.encode_version(pe, version)
        })?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for ProduceRequest {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, transactional_id) = if version >= 3 {
            wire::nullable_string(flexible)(s)?
        } else {
            (s, None)
        };
        let (s, acks) = parse_i16(s)?;
        let (s, timeout_ms) = parse_i32(s)?;
        let (s, topic_data) =
            wire::array(flexible, |s| TopicProduceData::parse_version(s, version))(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            ProduceRequest {
                transactional_id,
                acks,
                timeout_ms,
                topic_data,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        if version >= 3 {
            wire::put_nullable_string(pe, flexible, self.transactional_id.as_deref())?;
        }
        pe.put_i16(self.acks);
        pe.put_i32(self.timeout_ms);
        wire::put_array(pe, flexible, &self.topic_data, |pe, t| {
            t.encode_version(pe, version)
        })?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl TopicsAndGroups for ProduceRequest {
    fn topics(&self) -> Vec<String> {
        self.topic_data.iter().map(|t| t.name.clone()).collect()
    }
}

request_versions! {
    ProduceRequest, ApiKey::Produce => {
        ProduceRequestV0 = 0,
        ProduceRequestV1 = 1,
        ProduceRequestV2 = 2,
        ProduceRequestV3 = 3,
        ProduceRequestV4 = 4,
        ProduceRequestV5 = 5,
        ProduceRequestV6 = 6,
        ProduceRequestV7 = 7,
        ProduceRequestV8 = 8,
        ProduceRequestV9 = 9,
    }
}
