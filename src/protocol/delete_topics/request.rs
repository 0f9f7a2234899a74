//! Decoding and encoding for Delete Topics requests.
//!
//! ### Protocol Def
//! ```text
//! DeleteTopics Request (Version: 0-5) => [topic_names] timeout_ms TAG_BUFFER
//!   topic_names => STRING
//!   timeout_ms => INT32
//!
//! DeleteTopics Request (Version: 6) => [topics] timeout_ms TAG_BUFFER
//!   topics => name topic_id TAG_BUFFER
//!     name => COMPACT_NULLABLE_STRING
//!     topic_id => UUID
//!   timeout_ms => INT32
//! ```
//!
//! Version 4 is the first flexible version. From version 6 topics may be
//! named by id alone.

use nombytes::NomBytes;

use crate::{
    encode::{PacketEncoder, Uuid},
    error::Result,
    parser::{parse_i32, parse_uuid, ParseResult},
    protocol::{wire, ApiKey, TopicsAndGroups, Versioned},
    tagged_fields::TaggedFields,
};

pub const FLEXIBLE_VERSION: i16 = 4;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteTopicsRequest {
    /// The name or topic ID of the topic.
    pub topics: Vec<DeleteTopicState>,
    /// The names of the topics to delete.
    pub topic_names: Vec<String>,
    /// The length of time in milliseconds to wait for the deletions to complete.
    pub timeout_ms: i32,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteTopicState {
    /// The topic name.
    pub name: Option<String>,
    /// The unique topic ID.
    pub topic_id: Uuid,
    pub tagged_fields: TaggedFields,
}

impl Versioned for DeleteTopicState {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, name) = wire::nullable_string(flexible)(s)?;
        let (s, topic_id) = parse_uuid(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            DeleteTopicState {
                name,
                topic_id,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_nullable_string(pe, flexible, self.name.as_deref())?;
        pe.put_uuid(&self.topic_id);
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for DeleteTopicsRequest {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, topics) = if version >= 6 {
            wire::array(flexible, |s| DeleteTopicState::parse_version(s, version))(s)?
        } else {
            (s, vec![])
        };
        let (s, topic_names) = if version <= 5 {
            wire::array(flexible, wire::string(flexible))(s)?
        } else {
            (s, vec![])
        };
        let (s, timeout_ms) = parse_i32(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            DeleteTopicsRequest {
                topics,
                topic_names,
                timeout_ms,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        if version >= 6 {
            wire::put_array(pe, flexible, &self.topics, |pe, t| {
                t.encode_version(pe, version)
            })?;
        } else {
            wire::put_array(pe, flexible, &self.topic_names, |pe, name| {
                wire::put_string(pe, flexible, name)
            })?;
        }
        pe.put_i32(self.timeout_ms);
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl TopicsAndGroups for DeleteTopicsRequest {
    fn topics(&self) -> Vec<String> {
        self.topic_names
            .iter()
            .cloned()
            .chain(self.topics.iter().filter_map(|t| t.name.clone()))
            .collect()
    }
}

request_versions! {
    DeleteTopicsRequest, ApiKey::DeleteTopics => {
        DeleteTopicsRequestV0 = 0,
        DeleteTopicsRequestV1 = 1,
        DeleteTopicsRequestV2 = 2,
        DeleteTopicsRequestV3 = 3,
        DeleteTopicsRequestV4 = 4,
        DeleteTopicsRequestV5 = 5,
        DeleteTopicsRequestV6 = 6,
    }
}
