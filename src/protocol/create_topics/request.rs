//! Decoding and encoding for Create Topics requests.
//!
//! ### Protocol Def
//! ```text
//! CreateTopics Request (Version: 0-7) => [topics] timeout_ms validate_only TAG_BUFFER
//!  topics => name num_partitions replication_factor [assignments] [configs] TAG_BUFFER
//!    name => STRING
//!    num_partitions => INT32
//!    replication_factor => INT16
//!    assignments => partition_index [broker_ids] TAG_BUFFER
//!      partition_index => INT32
//!      broker_ids => INT32
//!    configs => name value TAG_BUFFER
//!      name => STRING
//!      value => NULLABLE_STRING
//!  timeout_ms => INT32
//!  validate_only => BOOLEAN                 (v1+)
//! ```
//!
//! Version 5 is the first flexible version.

use nombytes::NomBytes;

use crate::{
    encode::PacketEncoder,
    error::Result,
    parser::{parse_bool, parse_i16, parse_i32, ParseResult},
    protocol::{wire, ApiKey, TopicsAndGroups, Versioned},
    tagged_fields::TaggedFields,
};

pub const FLEXIBLE_VERSION: i16 = 5;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateTopicsRequest {
    /// The topics to create.
    pub topics: Vec<CreatableTopic>,
    /// How long to wait in milliseconds before timing out the request.
    pub timeout_ms: i32,
    /// If true, check that the topics can be created as specified, but don't create anything.
    pub validate_only: bool,
    pub tagged_fields: TaggedFields,
}

/// The topics to create.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreatableTopic {
    /// The topic name.
    pub name: String,
    /// The number of partitions to create in the topic, or -1 if we are either specifying a manual partition assignment or using the default partitions.
    pub num_partitions: i32,
    /// The number of replicas to create for each partition in the topic, or -1 if we are either specifying a manual partition assignment or using the default replication factor.
    pub replication_factor: i16,
    /// The manual partition assignment, or the empty array if we are using automatic assignment.
    pub assignments: Vec<CreatableReplicaAssignment>,
    /// The custom topic configurations to set.
    pub configs: Vec<CreatableTopicConfig>,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreatableReplicaAssignment {
    /// The partition index.
    pub partition_index: i32,
    /// The brokers to place the partition on.
    pub broker_ids: Vec<i32>,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreatableTopicConfig {
    /// The configuration name.
    pub name: String,
    /// The configuration value.
    pub value: Option<String>,
    pub tagged_fields: TaggedFields,
}

impl Versioned for CreatableReplicaAssignment {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, partition_index) = parse_i32(s)?;
        let (s, broker_ids) = wire::i32_array(flexible)(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            CreatableReplicaAssignment {
                partition_index,
                broker_ids,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        pe.put_i32(self.partition_index);
        wire::put_i32_array(pe, flexible, &self.broker_ids)?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for CreatableTopicConfig {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, name) = wire::string(flexible)(s)?;
        let (s, value) = wire::nullable_string(flexible)(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            CreatableTopicConfig {
                name,
                value,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_string(pe, flexible, &self.name)?;
        wire::put_nullable_string(pe, flexible, self.value.as_deref())?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for CreatableTopic {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, name) = wire::string(flexible)(s)?;
        let (s, num_partitions) = parse_i32(s)?;
        let (s, replication_factor) = parse_i16(s)?;
        let (s, assignments) = wire::array(flexible, |s| {
            CreatableReplicaAssignment::parse_version(s, version)
        })(s)?;
        let (s, configs) =
            wire::array(flexible, |s| CreatableTopicConfig::parse_version(s, version))(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            CreatableTopic {
                name,
                num_partitions,
                replication_factor,
                assignments,
                configs,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_string(pe, flexible, &self.name)?;
        pe.put_i32(self.num_partitions);
        pe.put_i16(self.replication_factor);
        wire::put_array(pe, flexible, &self.assignments, |pe, a| {
            a.encode_version(pe, version)
        })?;
        wire::put_array(pe, flexible, &self.configs, |pe, c| {
            c.encode_version(pe, version)
        })?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for CreateTopicsRequest {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, topics) = wire::array(flexible, |s| CreatableTopic::parse_version(s, version))(s)?;
        let (s, timeout_ms) = parse_i32(s)?;
        let (s, validate_only) = if version >= 1 {
            parse_bool(s)?
        } else {
            (s, false)
        };
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            CreateTopicsRequest {
                topics,
                timeout_ms,
                validate_only,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_array(pe, flexible, &self.topics, |pe, t| {
            t.encode_version(pe, version)
        })?;
        pe.put_i32(self.timeout_ms);
        if version >= 1 {
            pe.put_bool(self.validate_only);
        }
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl TopicsAndGroups for CreateTopicsRequest {
    fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }
}

request_versions! {
    CreateTopicsRequest, ApiKey::CreateTopics => {
        CreateTopicsRequestV0 = 0,
        CreateTopicsRequestV1 = 1,
        CreateTopicsRequestV2 = 2,
        CreateTopicsRequestV3 = 3,
        CreateTopicsRequestV4 = 4,
        CreateTopicsRequestV5 = 5,
        CreateTopicsRequestV6 = 6,
        CreateTopicsRequestV7 = 7,
    }
}
