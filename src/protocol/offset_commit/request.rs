//! Decoding and encoding for Offset Commit requests.
//!
//! Note that when this API is used for a "simple consumer," which is not part of a consumer group, then the generationId must be set to -1 and the memberId must be empty (not null). Additionally, if there is an active consumer group with the same groupId, then the commit will be rejected (typically with an UNKNOWN_MEMBER_ID or ILLEGAL_GENERATION error).
//!
//! ### Protocol Def
//! ```text
//! OffsetCommit Request (Version: 0-8) => group_id generation_id_or_member_epoch member_id group_instance_id retention_time_ms [topics] TAG_BUFFER
//!   group_id => STRING
//!   generation_id_or_member_epoch => INT32      (v1+)
//!   member_id => STRING                         (v1+)
//!   group_instance_id => NULLABLE_STRING        (v7+)
//!   retention_time_ms => INT64                  (v2-4)
//!   topics => name [partitions] TAG_BUFFER
//!     name => STRING
//!     partitions => partition_index committed_offset committed_leader_epoch commit_timestamp committed_metadata TAG_BUFFER
//!       partition_index => INT32
//!       committed_offset => INT64
//!       committed_leader_epoch => INT32         (v6+)
//!       commit_timestamp => INT64               (v1 only)
//!       committed_metadata => NULLABLE_STRING
//! ```
//!
//! Version 8 is the first flexible version.

use nombytes::NomBytes;

use crate::{
    encode::PacketEncoder,
    error::Result,
    parser::{parse_i32, parse_i64, ParseResult},
    protocol::{wire, ApiKey, TopicsAndGroups, Versioned},
    tagged_fields::TaggedFields,
};

pub const FLEXIBLE_VERSION: i16 = 8;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OffsetCommitRequest {
    /// The unique group identifier.
    pub group_id: String,
    /// The generation of the group if using the generic group protocol or the member epoch if using the consumer protocol.
    pub generation_id_or_member_epoch: i32,
    /// The member ID assigned by the group coordinator.
    pub member_id: String,
    /// The unique identifier of the consumer instance provided by end user.
    pub group_instance_id: Option<String>,
    /// The time period in ms to retain the offset.
    pub retention_time_ms: i64,
    /// The topics to commit offsets for.
    pub topics: Vec<OffsetCommitTopic>,
    pub tagged_fields: TaggedFields,
}

/// The topics to commit offsets for.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OffsetCommitTopic {
    /// The topic name.
    pub name: String,
    /// Each partition to commit offsets for.
    pub partitions: Vec<OffsetCommitPartition>,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OffsetCommitPartition {
    /// The partition index.
    pub partition_index: i32,
    /// The message offset to be committed.
    pub committed_offset: i64,
    /// The leader epoch of this partition.
    pub committed_leader_epoch: i32,
    /// The timestamp of the commit.
    pub commit_timestamp: i64,
    /// Any associated metadata the client wants to keep.
    pub committed_metadata: Option<String>,
    pub tagged_fields: TaggedFields,
}

impl Versioned for OffsetCommitPartition {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, partition_index) = parse_i32(s)?;
        let (s, committed_offset) = parse_i64(s)?;
        let (s, committed_leader_epoch) = if version >= 6 { parse_i32(s)? } else { (s, -1) };
        let (s, commit_timestamp) = if version == 1 { parse_i64(s)? } else { (s, -1) };
        let (s, committed_metadata) = wire::nullable_string(flexible)(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            OffsetCommitPartition {
                partition_index,
                committed_offset,
                committed_leader_epoch,
                commit_timestamp,
                committed_metadata,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        pe.put_i32(self.partition_index);
        pe.put_i64(self.committed_offset);
        if version >= 6 {
            pe.put_i32(self.committed_leader_epoch);
        }
        if version == 1 {
            pe.put_i64(self.commit_timestamp);
        }
        wire::put_nullable_string(pe, flexible, self.committed_metadata.as_deref())?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for OffsetCommitTopic {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, name) = wire::string(flexible)(s)?;
        let (s, partitions) =
            wire::array(flexible, |s| OffsetCommitPartition::parse_version(s, version))(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            OffsetCommitTopic {
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

impl Versioned for OffsetCommitRequest {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, group_id) = wire::string(flexible)(s)?;
        let (s, generation_id_or_member_epoch) = if version >= 1 {
            parse_i32(s)?
        } else {
            (s, -1)
        };
        let (s, member_id) = if version >= 1 {
            wire::string(flexible)(s)?
        } else {
            (s, String::new())
        };
        let (s, group_instance_id) = if version >= 7 {
            wire::nullable_string(flexible)(s)?
        } else {
            (s, None)
        };
        let (s, retention_time_ms) = if (2..=4).contains(&version) {
            parse_i64(s)?
        } else {
            (s, -1)
        };
        let (s, topics) =
            wire::array(flexible, |s| OffsetCommitTopic::parse_version(s, version))(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            OffsetCommitRequest {
                group_id,
                generation_id_or_member_epoch,
                member_id,
                group_instance_id,
                retention_time_ms,
                topics,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_string(pe, flexible, &self.group_id)?;
        if version >= 1 {
            pe.put_i32(self.generation_id_or_member_epoch);
            wire::put_string(pe, flexible, &self.member_id)?;
        }
        if version >= 7 {
            wire::put_nullable_string(pe, flexible, self.group_instance_id.as_deref())?;
        }
        if (2..=4).contains(&version) {
            pe.put_i64(self.retention_time_ms);
        }
        wire::put_array(pe, flexible, &self.topics, |pe, t| {
            t.encode_version(pe, version)
        })?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl TopicsAndGroups for OffsetCommitRequest {
    fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }

    fn consumer_groups(&self) -> Vec<String> {
        vec![self.group_id.clone()]
    }
}

request_versions! {
    OffsetCommitRequest, ApiKey::OffsetCommit => {
        OffsetCommitRequestV0 = 0,
        OffsetCommitRequestV1 = 1,
        OffsetCommitRequestV2 = 2,
        OffsetCommitRequestV3 = 3,
        OffsetCommitRequestV4 = 4,
        OffsetCommitRequestV5 = 5,
        OffsetCommitRequestV6 = 6,
        OffsetCommitRequestV7 = 7,
        OffsetCommitRequestV8 = 8,
    }
}
