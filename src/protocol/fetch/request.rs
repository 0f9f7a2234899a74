//! Decoding and encoding for Fetch requests.
//!
//! ### Protocol Def
//! ```text
//! Fetch Request (Version: 0-12) => replica_id max_wait_ms min_bytes max_bytes isolation_level session_id session_epoch [topics] [forgotten_topics_data] rack_id TAG_BUFFER
//!   replica_id => INT32
//!   max_wait_ms => INT32
//!   min_bytes => INT32
//!   max_bytes => INT32                        (v3+)
//!   isolation_level => INT8                   (v4+)
//!   session_id => INT32                       (v7+)
//!   session_epoch => INT32                    (v7+)
//!   topics => topic [partitions] TAG_BUFFER
//!     topic => STRING
//!     partitions => partition current_leader_epoch fetch_offset last_fetched_epoch log_start_offset partition_max_bytes TAG_BUFFER
//!       partition => INT32
//!       current_leader_epoch => INT32         (v9+)
//!       fetch_offset => INT64
//!       last_fetched_epoch => INT32           (v12+)
//!       log_start_offset => INT64             (v5+)
//!       partition_max_bytes => INT32
//!   forgotten_topics_data => topic [partitions] TAG_BUFFER   (v7+)
//!     topic => STRING
//!     partitions => INT32
//!   rack_id => STRING                         (v11+)
//! ```
//!
//! Version 12 is the first flexible version. Later versions address topics
//! by id only and are not supported.

use nombytes::NomBytes;

use crate::{
    encode::PacketEncoder,
    error::Result,
    parser::{parse_i32, parse_i64, parse_i8, ParseResult},
    protocol::{wire, ApiKey, TopicsAndGroups, Versioned},
    tagged_fields::TaggedFields,
};

pub const FLEXIBLE_VERSION: i16 = 12;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchRequest {
    /// The broker ID of the follower, of -1 if this request is from a consumer.
    pub replica_id: i32,
    /// The maximum time in milliseconds to wait for the response.
    pub max_wait_ms: i32,
    /// The minimum bytes to accumulate in the response.
    pub min_bytes: i32,
    /// The maximum bytes to fetch.
    pub max_bytes: i32,
    /// This setting controls the visibility of transactional records.
    pub isolation_level: i8,
    /// The fetch session ID.
    pub session_id: i32,
    /// The fetch session epoch, which is used for ordering requests in a session.
    pub session_epoch: i32,
    /// The topics to fetch.
    pub topics: Vec<FetchTopic>,
    /// In an incremental fetch request, the partitions to remove.
    pub forgotten_topics_data: Vec<ForgottenTopic>,
    /// Rack ID of the consumer making this request.
    pub rack_id: String,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchTopic {
    pub topic: String,
    pub partitions: Vec<FetchPartition>,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchPartition {
    pub partition: i32,
    pub current_leader_epoch: i32,
    pub fetch_offset: i64,
    pub last_fetched_epoch: i32,
    pub log_start_offset: i64,
    pub partition_max_bytes: i32,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForgottenTopic {
    pub topic: String,
    pub partitions: Vec<i32>,
    pub tagged_fields: TaggedFields,
}

impl Versioned for FetchPartition {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, partition) = parse_i32(s)?;
        let (s, current_leader_epoch) = if version >= 9 { parse_i32(s)? } else { (s, -1) };
        let (s, fetch_offset) = parse_i64(s)?;
        let (s, last_fetched_epoch) = if version >= 12 { parse_i32(s)? } else { (s, -1) };
        let (s, log_start_offset) = if version >= 5 { parse_i64(s)? } else { (s, -1) };
        let (s, partition_max_bytes) = parse_i32(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            FetchPartition {
                partition,
                current_leader_epoch,
                fetch_offset,
                last_fetched_epoch,
                log_start_offset,
                partition_max_bytes,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        pe.put_i32(self.partition);
        if version >= 9 {
            pe.put_i32(self.current_leader_epoch);
        }
        pe.put_i64(self.fetch_offset);
        if version >= 12 {
            pe.put_i32(self.last_fetched_epoch);
        }
        if version >= 5 {
            pe.put_i64(self.log_start_offset);
        }
        pe.put_i32(self.partition_max_bytes);
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for FetchTopic {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, topic) = wire::string(flexible)(s)?;
        let (s, partitions) =
            wire::array(flexible, |s| FetchPartition::parse_version(s, version))(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            FetchTopic {
                topic,
                partitions,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_string(pe, flexible, &self.topic)?;
        wire::put_array(pe, flexible, &self.partitions, |pe, p| {
            p.encode_version(pe, version)
        })?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for ForgottenTopic {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, topic) = wire::string(flexible)(s)?;
        let (s, partitions) = wire::i32_array(flexible)(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            ForgottenTopic {
                topic,
                partitions,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_string(pe, flexible, &self.topic)?;
        wire::put_i32_array(pe, flexible, &self.partitions)?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for FetchRequest {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, replica_id) = parse_i32(s)?;
        let (s, max_wait_ms) = parse_i32(s)?;
        let (s, min_bytes) = parse_i32(s)?;
        let (s, max_bytes) = if version >= 3 {
            parse_i32(s)?
        } else {
            (s, i32::MAX)
        };
        let (s, isolation_level) = if version >= 4 { parse_i8(s)? } else { (s, 0) };
        let (s, session_id) = if version >= 7 { parse_i32(s)? } else { (s, 0) };
        let (s, session_epoch) = if version >= 7 { parse_i32(s)? } else { (s, -1) };
        let (s, topics) = wire::array(flexible, |s| FetchTopic::parse_version(s, version))(s)?;
        let (s, forgotten_topics_data) = if version >= 7 {
            wire::array(flexible, |s| ForgottenTopic::parse_version(s, version))(s)?
        } else {
            (s, vec![])
        };
        let (s, rack_id) = if version >= 11 {
            wire::string(flexible)(s)?
        } else {
            (s, String::new())
        };
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            FetchRequest {
                replica_id,
                max_wait_ms,
                min_bytes,
                max_bytes,
                isolation_level,
                session_id,
                session_epoch,
                topics,
                forgotten_topics_data,
                rack_id,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        pe.put_i32(self.replica_id);
        pe.put_i32(self.max_wait_ms);
        pe.put_i32(self.min_bytes);
        if version >= 3 {
            pe.put_i32(self.max_bytes);
        }
        if version >= 4 {
            pe.put_i8(self.isolation_level);
        }
        if version >= 7 {
            pe.put_i32(self.session_id);
            pe.put_i32(self.session_epoch);
        }
        wire::put_array(pe, flexible, &self.topics, |pe, t| {
            t.encode_version(pe, version)
        })?;
        if version >= 7 {
            wire::put_array(pe, flexible, &self.forgotten_topics_data, |pe, t| {
                t.encode_version(pe, version)
            })?;
        }
        if version >= 11 {
            wire::put_string(pe, flexible, &self.rack_id)?;
        }
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl TopicsAndGroups for FetchRequest {
    fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.iter().map(|t| t.topic.clone()).collect();
        for forgotten in &self.forgotten_topics_data {
            if !topics.contains(&forgotten.topic) {
                topics.push(forgotten.topic.clone());
            }
        }
        topics
    }
}

request_versions! {
    FetchRequest, ApiKey::Fetch => {
        FetchRequestV0 = 0,
        FetchRequestV1 = 1,
        FetchRequestV2 = 2,
        FetchRequestV3 = 3,
        FetchRequestV4 = 4,
        FetchRequestV5 = 5,
        FetchRequestV6 = 6,
        FetchRequestV7 = 7,
        FetchRequestV8 = 8,
        FetchRequestV9 = 9,
        FetchRequestV10 = 10,
        FetchRequestV11 = 11,
        FetchRequestV12 = 12,
    }
}
