//! Decoding and encoding for Create Partitions requests.
//!
//! ### Protocol Def
//! ```text
//! CreatePartitions Request (Version: 0-3) => [topics] timeout_ms validate_only TAG_BUFFER
//!   topics => name count [assignments] TAG_BUFFER
//!     name => STRING
//!     count => INT32
//!     assignments => [broker_ids] TAG_BUFFER   (nullable)
//!       broker_ids => INT32
//!   timeout_ms => INT32
//!   validate_only => BOOLEAN
//! ```
//!
//! Version 2 is the first flexible version.

use nombytes::NomBytes;

use crate::{
    encode::PacketEncoder,
    error::Result,
    parser::{parse_bool, parse_i32, ParseResult},
    protocol::{wire, ApiKey, TopicsAndGroups, Versioned},
    tagged_fields::TaggedFields,
};

pub const FLEXIBLE_VERSION: i16 = 2;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreatePartitionsRequest {
    /// Each topic that we want to create new partitions inside.
    pub topics: Vec<CreatePartitionsTopic>,
    /// The time in ms to wait for the partitions to be created.
    pub timeout_ms: i32,
    /// If true, then validate the request, but don't actually increase the number of partitions.
    pub validate_only: bool,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreatePartitionsTopic {
    /// The topic name.
    pub name: String,
    /// The new partition count.
    pub count: i32,
    /// The new partition assignments, or null to let the brokers pick.
    pub assignments: Option<Vec<CreatePartitionsAssignment>>,
    pub tagged_fields: TaggedFields,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreatePartitionsAssignment {
    /// The assigned broker IDs.
    pub broker_ids: Vec<i32>,
    pub tagged_fields: TaggedFields,
}

impl Versioned for CreatePartitionsAssignment {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, broker_ids) = wire::i32_array(flexible)(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            CreatePartitionsAssignment {
                broker_ids,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_i32_array(pe, flexible, &self.broker_ids)?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for CreatePartitionsTopic {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, name) = wire::string(flexible)(s)?;
        let (s, count) = parse_i32(s)?;
        let (s, assignments) = wire::nullable_array(flexible, |s| {
            CreatePartitionsAssignment::parse_version(s, version)
        })(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            CreatePartitionsTopic {
                name,
                count,
                assignments,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        wire::put_string(pe, flexible, &self.name)?;
        pe.put_i32(self.count);
        wire::put_nullable_array(pe, flexible, self.assignments.as_deref(), |pe, a| {
            a.encode_version(pe, version)
        })?;
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for CreatePartitionsRequest {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, topics) =
            wire::array(flexible, |s| CreatePartitionsTopic::parse_version(s, version))(s)?;
        let (s, timeout_ms) = parse_i32(s)?;
        let (s, validate_only) = parse_bool(s)?;
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            CreatePartitionsRequest {
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
        pe.put_bool(self.validate_only);
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl TopicsAndGroups for CreatePartitionsRequest {
    fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }
}

request_versions! {
    CreatePartitionsRequest, ApiKey::CreatePartitions => {
        CreatePartitionsRequestV0 = 0,
        CreatePartitionsRequestV1 = 1,
        CreatePartitionsRequestV2 = 2,
        CreatePartitionsRequestV3 = 3,
    }
}
