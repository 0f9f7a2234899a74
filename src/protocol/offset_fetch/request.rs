//! Decoding and encoding for Offset Fetch requests.
//!
//! ### Protocol Def
//! ```text
//! OffsetFetch Request (Version: 0-7) => group_id [topics] require_stable TAG_BUFFER
//!   group_id => STRING
//!   topics => name [partition_indexes] TAG_BUFFER     (nullable v2+)
//!     name => STRING
//!     partition_indexes => INT32
//!   require_stable => BOOLEAN                         (v7+)
//!
//! OffsetFetch Request (Version: 8) => [groups] require_stable TAG_BUFFER
//!   groups => group_id [topics] TAG_BUFFER
//!     group_id => COMPACT_STRING
//!     topics => name [partition_indexes] TAG_BUFFER   (nullable)
//!       name => COMPACT_STRING
//!       partition_indexes => INT32
//!   require_stable => BOOLEAN
//! ```
//!
//! Version 6 is the first flexible version. A null topic list fetches the
//! offsets of every topic the group has committed to.

use nombytes::NomBytes;

use crate::{
    encode::PacketEncoder,
    error::Result,
    parser::{parse_bool, ParseResult},
    protocol::{wire, ApiKey, TopicsAndGroups, Versioned},
    tagged_fields::TaggedFields,
};

pub const FLEXIBLE_VERSION: i16 = 6;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OffsetFetchRequest {
    /// The group to fetch offsets for. Only present up to v7.
    pub group_id: Option<String>,
    /// Each topic we would like to fetch offsets for, or null to fetch offsets for all topics.
    pub topics: Option<Vec<OffsetFetchTopic>>,
    /// Each group we would like to fetch offsets for.
    pub groups: Vec<OffsetFetchGroup>,
    /// Whether broker should hold on returning unstable offsets but set a retriable error code for the partitions.
    pub require_stable: bool,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OffsetFetchTopic {
    /// The topic name.
    pub name: String,
    /// The partition indexes we would like to fetch offsets for.
    pub partition_indexes: Vec<i32>,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OffsetFetchGroup {
    pub group_id: String,
    pub topics: Option<Vec<OffsetFetchTopic>>,
    pub tagged_fields: TaggedFields,
}

impl Versioned for OffsetFetchTopic {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, name) = wire::string(flexible)(s)?;
        let (s, partition_indexes) = wire::i32_array(flexible)(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            OffsetFetchTopic {
                name,
                partition_indexes,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_string(pe, flexible, &self.name)?;
        wire::put_i32_array(pe, flexible, &self.partition_indexes)?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for OffsetFetchGroup {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, group_id) = wire::string(flexible)(s)?;
        let (s, topics) =
            wire::nullable_array(flexible, |s| OffsetFetchTopic::parse_version(s, version))(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            OffsetFetchGroup {
                group_id,
                topics,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_string(pe, flexible, &self.group_id)?;
        wire::put_nullable_array(pe, flexible, self.topics.as_deref(), |pe, t| {
            t.encode_version(pe, version)
        })?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for OffsetFetchRequest {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let parse_topic = |s| OffsetFetchTopic::parse_version(s, version);
        let (s, group_id, topics) = if version <= 7 {
            let (s, group_id) = wire::string(flexible)(s)?;
            let group_id = Some(group_id);
            let (s, topics) = if version >= 2 {
                wire::nullable_array(flexible, parse_topic)(s)?
            } else {
                let (s, topics) = wire::array(flexible, parse_topic)(s)?;
                (s, Some(topics))
            };
            (s, group_id, topics)
        } else {
            (s, None, None)
        };
        let (s, groups) = if version >= 8 {
            wire::array(flexible, |s| OffsetFetchGroup::parse_version(s, version))(s)?
        } else {
            (s, vec![])
        };
        let (s, require_stable) = if version >= 7 {
            parse_bool(s)?
        } else {
            (s, false)
        };
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            OffsetFetchRequest {
                group_id,
                topics,
                groups,
                require_stable,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        let encode_topic = |pe: &mut E, t: &OffsetFetchTopic| t.encode_version(pe, version);
        if version <= 7 {
            let group_id = self.group_id.as_deref().unwrap_or_default();
            wire::put_string(pe, flexible, group_id)?;
            if version >= 2 {
                wire::put_nullable_array(pe, flexible, self.topics.as_deref(), encode_topic)?;
            } else {
                let topics = self.topics.as_deref().unwrap_or_default();
                wire::put_array(pe, flexible, topics, encode_topic)?;
            }
        }
        if version >= 8 {
            wire::put_array(pe, flexible, &self.groups, |pe, g| {
                g.encode_version(pe, version)
            })?;
        }
        if version >= 7 {
            pe.put_bool(self.require_stable);
        }
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl TopicsAndGroups for OffsetFetchRequest {
    fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = vec![];
        let listed = self
            .topics
            .iter()
            .flatten()
            .chain(self.groups.iter().flat_map(|g| g.topics.iter().flatten()));
        for topic in listed {
            if !topics.contains(&topic.name) {
                topics.push(topic.name.clone());
            }
        }
        topics
    }

    fn consumer_groups(&self) -> Vec<String> {
        self.group_id
            .iter()
            .cloned()
            .chain(self.groups.iter().map(|g| g.group_id.clone()))
            .collect()
    }
}

request_versions! {
    OffsetFetchRequest, ApiKey::OffsetFetch => {
        OffsetFetchRequestV0 = 0,
        OffsetFetchRequestV1 = 1,
        OffsetFetchRequestV2 = 2,
        OffsetFetchRequestV3 = 3,
        OffsetFetchRequestV4 = 4,
        OffsetFetchRequestV5 = 5,
        OffsetFetchRequestV6 = 6,
        OffsetFetchRequestV7 = 7,
        OffsetFetchRequestV8 = 8,
    }
}
