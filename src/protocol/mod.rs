//! Bytecode protocol requests & responses.
//!
//! This module implements the parts of the bytecode protocol outlined in the
//! [Kafka Documentation](https://kafka.apache.org/protocol.html) that a proxy
//! needs to look into.
//!
//! The module is set up as one sub-module per api key. Request files hold a
//! layout struct covering every supported version of that request together
//! with one body type per version; decoding a body reads exactly the fields
//! of its version, in wire order, and keeps the topic names and consumer
//! group ids the proxy routes and authorizes on. Response files hold the
//! schemas of the responses whose broker endpoints get rewritten.
//!
//! [`RequestTypeFactory`] picks the body for a
//! [`RequestKeyVersion`] read off the front of a frame:
//!
//! ```rust
//! use bytes::Bytes;
//! use kafka_proxy_codec::prelude::*;
//!
//! // Metadata v0 for the topic "rust"
//! let frame = Bytes::from_static(&[
//!     0, 0, 0, 20, 0, 3, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 4, b'r', b'u', b's', b't',
//! ]);
//! let request = Request::decode(frame).unwrap();
//! assert_eq!(request.topics(), vec!["rust".to_string()]);
//! ```

// Stamps out one body type per supported version of a request. Each type
// wraps the shared layout and pins the api key and version it decodes.
macro_rules! request_versions {
    (
        $layout:ident, $key:expr => {
            $( $(#[$meta:meta])* $name:ident = $version:literal, )+
        }
    ) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug, Default, PartialEq)]
            pub struct $name(pub $layout);

            impl $name {
                pub const API_KEY: i16 = $key as i16;
                pub const API_VERSION: i16 = $version;
            }

            impl $crate::protocol::ProtocolBody for $name {
                fn key(&self) -> i16 {
                    Self::API_KEY
                }

                fn version(&self) -> i16 {
                    Self::API_VERSION
                }
            }

            impl $crate::parser::FromByte for $name {
                fn decode(s: nombytes::NomBytes) -> $crate::parser::ParseResult<Self> {
                    let (s, body) =
                        <$layout as $crate::protocol::Versioned>::parse_version(s, $version)?;
                    Ok((s, $name(body)))
                }
            }

            impl $crate::encode::ToByte for $name {
                fn encode<E: $crate::encode::PacketEncoder>(
                    &self,
                    pe: &mut E,
                ) -> $crate::error::Result<()> {
                    tracing::trace!("Encoding {} {:?}", stringify!($name), self);
                    $crate::protocol::Versioned::encode_version(&self.0, pe, $version)
                }
            }

            impl $crate::protocol::TopicsAndGroups for $name {
                fn topics(&self) -> Vec<String> {
                    $crate::protocol::TopicsAndGroups::topics(&self.0)
                }

                fn consumer_groups(&self) -> Vec<String> {
                    $crate::protocol::TopicsAndGroups::consumer_groups(&self.0)
                }

                fn all_topics(&self) -> bool {
                    $crate::protocol::Versioned::covers_all_topics(&self.0, $version)
                }
            }

            impl std::ops::Deref for $name {
                type Target = $layout;

                fn deref(&self) -> &Self::Target {
                    &self.0
                }
            }

            impl From<$layout> for $name {
                fn from(layout: $layout) -> Self {
                    $name(layout)
                }
            }
        )+
    };
}

pub mod body;
pub mod create_partitions;
pub mod create_topics;
pub mod delete_topics;
pub mod fetch;
pub mod find_coordinator;
pub mod header;
pub mod list_offsets;
pub mod metadata;
pub mod offset_commit;
pub mod offset_fetch;
pub mod produce;
pub(crate) mod wire;

use nombytes::NomBytes;
use num_derive::FromPrimitive;

use crate::{
    encode::{PacketEncoder, ToByte},
    error::Result,
    parser::{Decoder, ParseResult},
};

// re exporting these for ease
pub use self::{
    body::{RequestBody, RequestFactory, RequestTypeFactory},
    create_partitions::request::CreatePartitionsRequest,
    create_topics::request::CreateTopicsRequest,
    delete_topics::request::DeleteTopicsRequest,
    fetch::request::FetchRequest,
    header::{Request, RequestKeyVersion, RequestV2, ResponseHeader},
    list_offsets::request::ListOffsetsRequest,
    metadata::request::MetadataRequest,
    offset_commit::request::OffsetCommitRequest,
    offset_fetch::request::OffsetFetchRequest,
    produce::request::ProduceRequest,
};

/// Numeric codes identifying each request type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(i16)]
pub enum ApiKey {
    Produce = 0,
    Fetch = 1,
    ListOffsets = 2,
    Metadata = 3,
    LeaderAndIsr = 4,
    StopReplica = 5,
    UpdateMetadata = 6,
    ControlledShutdown = 7,
    OffsetCommit = 8,
    OffsetFetch = 9,
    FindCoordinator = 10,
    JoinGroup = 11,
    Heartbeat = 12,
    LeaveGroup = 13,
    SyncGroup = 14,
    DescribeGroups = 15,
    ListGroups = 16,
    SaslHandshake = 17,
    ApiVersions = 18,
    CreateTopics = 19,
    DeleteTopics = 20,
    DeleteRecords = 21,
    InitProducerId = 22,
    OffsetForLeaderEpoch = 23,
    AddPartitionsToTxn = 24,
    AddOffsetsToTxn = 25,
    EndTxn = 26,
    WriteTxnMarkers = 27,
    TxnOffsetCommit = 28,
    DescribeAcls = 29,
    CreateAcls = 30,
    DeleteAcls = 31,
    DescribeConfigs = 32,
    AlterConfigs = 33,
    AlterReplicaLogDirs = 34,
    DescribeLogDirs = 35,
    SaslAuthenticate = 36,
    CreatePartitions = 37,
    CreateDelegationToken = 38,
    RenewDelegationToken = 39,
    ExpireDelegationToken = 40,
    DescribeDelegationToken = 41,
    DeleteGroups = 42,
    ElectLeaders = 43,
    IncrementalAlterConfigs = 44,
    AlterPartitionReassignments = 45,
    ListPartitionReassignments = 46,
    OffsetDelete = 47,
    DescribeClientQuotas = 48,
    AlterClientQuotas = 49,
    DescribeUserScramCredentials = 50,
    AlterUserScramCredentials = 51,
}

impl ApiKey {
    pub fn from_i16(key: i16) -> Option<Self> {
        num_traits::FromPrimitive::from_i16(key)
    }
}

/// A request body of one fixed (api key, api version).
pub trait ProtocolBody: ToByte + Decoder {
    fn key(&self) -> i16;
    fn version(&self) -> i16;
}

/// Names a request refers to, for the authorization layer.
pub trait TopicsAndGroups {
    fn topics(&self) -> Vec<String>;

    fn consumer_groups(&self) -> Vec<String> {
        vec![]
    }

    /// True when the request covers every topic of the cluster instead of
    /// naming them; [`topics`](Self::topics) is empty then.
    fn all_topics(&self) -> bool {
        false
    }
}

/// A layout shared by several versions of a message. Which fields are read
/// or written, and in which encoding, depends on `version`.
pub trait Versioned: Sized {
    fn parse_version(s: NomBytes, version: i16) -> ParseResult<Self>;
    fn encode_version<E: PacketEncoder>(&self, pe: &mut E, version: i16) -> Result<()>;

    /// Whether this layout, read as `version`, refers to every topic.
    fn covers_all_topics(&self, _version: i16) -> bool {
        false
    }
}
