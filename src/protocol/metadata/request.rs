//! Decoding and encoding for Metadata requests.
//!
//! ### Protocol Def
//! ```text
//! Metadata Request (Version: 0-12) => [topics] allow_auto_topic_creation include_cluster_authorized_operations include_topic_authorized_operations TAG_BUFFER
//!   topics => topic_id name TAG_BUFFER      (nullable v1+)
//!     topic_id => UUID                      (v10+)
//!     name => STRING                        (nullable v10+)
//!   allow_auto_topic_creation => BOOLEAN    (v4+)
//!   include_cluster_authorized_operations => BOOLEAN   (v8-10)
//!   include_topic_authorized_operations => BOOLEAN     (v8+)
//! ```
//!
//! Version 9 is the first flexible version. A null topic array asks for
//! every topic in the cluster, as does an empty one in version 0.

use nombytes::NomBytes;

use crate::{
    encode::{PacketEncoder, Uuid},
    error::Result,
    parser::{parse_bool, parse_uuid, ParseResult},
    protocol::{wire, ApiKey, TopicsAndGroups, Versioned},
    tagged_fields::TaggedFields,
};

pub const FLEXIBLE_VERSION: i16 = 9;

#[derive(Clone, Debug, PartialEq)]
pub struct MetadataRequest {
    /// The topics to fetch metadata for, `None` for all topics.
    pub topics: Option<Vec<MetadataRequestTopic>>,
    /// If this is true, the broker may auto-create topics that we requested which do not already exist, if it is configured to do so.
    pub allow_auto_topic_creation: bool,
    /// Whether to include cluster authorized operations.
    pub include_cluster_authorized_operations: bool,
    /// Whether to include topic authorized operations.
    pub include_topic_authorized_operations: bool,
    pub tagged_fields: TaggedFields,
}

impl Default for MetadataRequest {
    fn default() -> Self {
        MetadataRequest {
            topics: Some(vec![]),
            allow_auto_topic_creation: true,
            include_cluster_authorized_operations: false,
            include_topic_authorized_operations: false,
            tagged_fields: TaggedFields::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataRequestTopic {
    pub topic_id: Uuid,
    /// The topic name, null when the topic is addressed by id.
    pub name: Option<String>,
    pub tagged_fields: TaggedFields,
}

impl Versioned for MetadataRequestTopic {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let (s, topic_id) = if version >= 10 {
            parse_uuid(s)?
        } else {
            (s, Uuid::default())
        };
        let (s, name) = if version >= 10 {
            wire::nullable_string(flexible)(s)?
        } else {
            let (s, name) = wire::string(flexible)(s)?;
            (s, Some(name))
        };
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            MetadataRequestTopic {
                topic_id,
                name,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        if version >= 10 {
            pe.put_uuid(&self.topic_id);
            wire::put_nullable_string(pe, flexible, self.name.as_deref())?;
        } else {
            wire::put_string(pe, flexible, self.name.as_deref().unwrap_or_default())?;
        }
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }
}

impl Versioned for MetadataRequest {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;
        let parse_topic = |s| MetadataRequestTopic::parse_version(s, version);
        let (s, topics) = if version == 0 {
            let (s, topics) = wire::array(flexible, parse_topic)(s)?;
            (s, Some(topics))
        } else {
            wire::nullable_array(flexible, parse_topic)(s)?
        };
        let (s, allow_auto_topic_creation) = if version >= 4 {
            parse_bool(s)?
        } else {
            (s, true)
        };
        let (s, include_cluster_authorized_operations) = if (8..=10).contains(&version) {
            parse_bool(s)?
        } else {
            (s, false)
        };
        let (s, include_topic_authorized_operations) = if version >= 8 {
            parse_bool(s)?
        } else {
            (s, false)
        };
        let (s, tagged_fields) = wire::tagged_fields(flexible)(s)?;
        Ok((
            s,
            MetadataRequest {
                topics,
                allow_auto_topic_creation,
                include_cluster_authorized_operations,
                include_topic_authorized_operations,
                tagged_fields,
            },
        ))
    }

    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()> {
        let flexible = version >= FLEXIBLE_VERSION;
        let encode_topic = |pe: &mut E, t: &MetadataRequestTopic| t.encode_version(pe, version);
        if version == 0 {
            let topics = self.topics.as_deref().unwrap_or_default();
            wire::put_array(pe, flexible, topics, encode_topic)?;
        } else {
            wire::put_nullable_array(pe, flexible, self.topics.as_deref(), encode_topic)?;
        }
        if version >= 4 {
            pe.put_bool(self.allow_auto_topic_creation);
        }
        if (8..=10).contains(&version) {
            pe.put_bool(self.include_cluster_authorized_operations);
        }
        if version >= 8 {
            pe.put_bool(self.include_topic_authorized_operations);
        }
        wire::put_tagged_fields(pe, flexible, &self.tagged_fields)
    }

    // v0 asks for every topic with an empty array, later versions with null
    fn covers_all_topics(&self, version: i16) -> bool {
        match &self.topics {
            None => true,
            Some(topics) => version == 0 && topics.is_empty(),
        }
    }
}

impl TopicsAndGroups for MetadataRequest {
    fn topics(&self) -> Vec<String> {
        self.topics
            .iter()
            .flatten()
            .filter_map(|t| t.name.clone())
            .collect()
    }
}

request_versions! {
    MetadataRequest, ApiKey::Metadata => {
        MetadataRequestV0 = 0,
        MetadataRequestV1 = 1,
        MetadataRequestV2 = 2,
        MetadataRequestV3 = 3,
        MetadataRequestV4 = 4,
        MetadataRequestV5 = 5,
        MetadataRequestV6 = 6,
        MetadataRequestV7 = 7,
        MetadataRequestV8 = 8,
        MetadataRequestV9 = 9,
        MetadataRequestV10 = 10,
        MetadataRequestV11 = 11,
        MetadataRequestV12 = 12,
    }
}
