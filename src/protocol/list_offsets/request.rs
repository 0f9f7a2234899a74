//! Decoding and encoding for List Offsets requests.
//!
//! ### Protocol Def
//! ```text
//! ListOffsets Request (Version: 0-7) => replica_id isolation_level [topics] TAG_BUFFER
//!   replica_id => INT32
//!   isolation_level => INT8                 (v2+)
//!   topics => name [partitions] TAG_BUFFER
//!     name => STRING
//!     partitions => partition_index current_leader_epoch timestamp max_num_offsets TAG_BUFFER
//!       partition_index => INT32
//!       current_leader_epoch => INT32       (v4+)
//!       timestamp => INT64
//!       max_num_offsets => INT32            (v0 only)
//! ```
//!
//! Version 6 is the first flexible version.

use nombytes::NomBytes;

use crate::{
    encode::PacketEncoder,
    error::Result,
    parser::{parse_i32, parse_i64, parse_i8, ParseResult},
    protocol::{wire, ApiKey, TopicsAndGroups, Versioned},
    tagged_fields::TaggedFields,
};

pub const FLEXIBLE_VERSION: i16 = 6;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOffsetsRequest {
    /// The broker ID of the requestor, or -1 if this request is being made by a normal consumer.
    pub replica_id: i32,
    /// This setting controls the visibility of transactional records.
    pub isolation_level: i8,
    /// Each topic in the request.
    pub topics: Vec<ListOffsetsTopic>,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOffsetsTopic {
    /// The topic name.
    pub name: String,
    /// Each partition in the request.
    pub partitions: Vec<ListOffsetsPartition>,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOffsetsPartition {
    pub partition_index: i32,
    pub current_leader_epoch: i32,
    /// The current timestamp.
    pub timestamp: i64,
    /// The maximum number of offsets to report.
    pub max_num_offsets: i32,
    pub tagged_fields: TaggedFields,
}

impl Versioned for ListOffsetsPartition {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, partition_index) = parse_i32(s)?;
        let (s, current_leader_epoch) = if version >= 4 { parse_i32(s)? } else { (s, -1) };
        let (s, timestamp) = parse_i64(s)?;
        let (s, max_num_offsets) = if version == 0 { parse_i32(s)? } else { (s, 1) };
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            ListOffsetsPartition {
                partition_index,
                current_leader_epoch,
                timestamp,
                max_num_offsets,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        pe.put_i32(self.partition_index);
        if version >= 4 {
            pe.put_i32(self.current_leader_epoch);
        }
        pe.put_i64(self.timestamp);
        if version == 0 {
            pe.put_i32(self.max_num_offsets);
        }
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for ListOffsetsTopic {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, name) = wire::string(flexible)(s)?;
        let (s, partitions) =
            wire::array(flexible, |s| ListOffsetsPartition::parse_version(s, version))(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            ListOffsetsTopic {
                name,
                partitions,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_string(pe, flexible, &self.name)?;
        wire::put_array(pe, flexible, &self.partitions, |pe, p| {
            p.encode_version(pe, version)
        })?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for ListOffsetsRequest {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, replica_id) = parse_i32(s)?;
        let (s, isolation_level) = if version >= 2 { parse_i8(s)? } else { (s, 0) };
        let (s, topics) =
            wire::array(flexible, |s| ListOffsetsTopic::parse_version(s, version))(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            ListOffsetsRequest {
                replica_id,
                isolation_level,
                topics,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        pe.put_i32(self.replica_id);
        if version >= 2 {
            pe.put_i8(self.isolation_level);
        }
        wire::put_array(pe, flexible, &self.topics, |pe, t| {
            t.encode_version(pe, version)
        })?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl TopicsAndGroups for ListOffsetsRequest {
    fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }
}

request_versions! {
    ListOffsetsRequest, ApiKey::ListOffsets => {
        ListOffsetsRequestV0 = 0,
        ListOffsetsRequestV1 = 1,
        ListOffsetsRequestV2 = 2,
        ListOffsetsRequestV3 = 3,
        ListOffsetsRequestV4 = 4,
        ListOffsetsRequestV5 = 5,
        ListOffsetsRequestV6 = 6,
        ListOffsetsRequestV7 = 7,
    }
}
