//! The closed set of request bodies and the factories selecting one for a
//! [`RequestKeyVersion`].
//!
//! Dispatch is two-level: [`RequestTypeFactory`] maps the api key to its
//! per-key factory, which maps the api version to an empty body ready to be
//! decoded. Unknown keys and versions are errors; a caller must not take
//! "no decoder" to mean "nothing to authorize".
//!
//! ### Example
//! ```rust
//! use kafka_proxy_codec::prelude::*;
//!
//! let key_version = RequestKeyVersion {
//!     length: 20,
//!     api_key: 3,
//!     api_version: 0,
//! };
//! let body = RequestTypeFactory.produce(&key_version).unwrap();
//! assert_eq!((body.key(), body.version()), (3, 0));
//! ```

use nombytes::NomBytes;

use crate::{
    encode::{PacketEncoder, ToByte},
    error::{Error, Result},
    parser::{Decoder, ParseResult},
    protocol::{ApiKey, ProtocolBody, RequestKeyVersion, TopicsAndGroups},
};

/// Something that can hand out an empty body for a key and version.
pub trait RequestFactory {
    fn produce(&self, key_version: &RequestKeyVersion) -> Result<RequestBody>;
}

macro_rules! request_bodies {
    (
        $(
            $key:ident, $module:ident => $factory:ident {
                $( $version:literal => $body:ident, )+
            }
        )+
    ) => {
        /// One decoded request body of a fixed api key and version.
        #[derive(Clone, Debug, PartialEq)]
        pub enum RequestBody {
            $( $( $body(super::$module::request::$body), )+ )+
        }

        $( $(
            impl From<super::$module::request::$body> for RequestBody {
                fn from(body: super::$module::request::$body) -> Self {
                    RequestBody::$body(body)
                }
            }
        )+ )+

        impl ProtocolBody for RequestBody {
            fn key(&self) -> i16 {
                match self {
                    $( $( RequestBody::$body(b) => b.key(), )+ )+
                }
            }

            fn version(&self) -> i16 {
                match self {
                    $( $( RequestBody::$body(b) => b.version(), )+ )+
                }
            }
        }

        impl ToByte for RequestBody {
            fn encode<E: PacketEncoder>(&self, pe: &mut E) -> Result<()> {
                match self {
                    $( $( RequestBody::$body(b) => b.encode(pe), )+ )+
                }
            }
        }

        impl Decoder for RequestBody {
            fn decode_from(&mut self, s: NomBytes) -> ParseResult<()> {
                match self {
                    $( $( RequestBody::$body(b) => b.decode_from(s), )+ )+
                }
            }
        }

        impl TopicsAndGroups for RequestBody {
            fn topics(&self) -> Vec<String> {
                match self {
                    $( $( RequestBody::$body(b) => b.topics(), )+ )+
                }
            }

            fn consumer_groups(&self) -> Vec<String> {
                match self {
                    $( $( RequestBody::$body(b) => b.consumer_groups(), )+ )+
                }
            }

            fn all_topics(&self) -> bool {
                match self {
                    $( $( RequestBody::$body(b) => b.all_topics(), )+ )+
                }
            }
        }

        $(
            #[derive(Clone, Copy, Debug, Default)]
            pub struct $factory;

            impl $factory {
                pub const API_KEY: ApiKey = ApiKey::$key;
                /// Versions below this one use the classic encodings.
                pub const FLEXIBLE_VERSION: i16 = super::$module::request::FLEXIBLE_VERSION;
                pub const VERSIONS: &'static [i16] = &[$( $version ),+];

                pub fn supports(version: i16) -> bool {
                    Self::VERSIONS.contains(&version)
                }
            }

            impl RequestFactory for $factory {
                fn produce(&self, key_version: &RequestKeyVersion) -> Result<RequestBody> {
                    if key_version.api_key != Self::API_KEY as i16 {
                        return Err(Error::UnsupportedApiKey(key_version.api_key));
                    }
                    match key_version.api_version {
                        $( $version => Ok(RequestBody::$body(Default::default())), )+
                        api_version => Err(Error::UnsupportedApiVersion {
                            api_key: key_version.api_key,
                            api_version,
                        }),
                    }
                }
            }
        )+

        impl RequestTypeFactory {
            /// Every api key with a decoder, paired with its supported versions.
            pub const SUPPORTED: &'static [(ApiKey, &'static [i16])] = &[
                $( (ApiKey::$key, $factory::VERSIONS), )+
            ];

            /// The factory for `api_key`.
            pub fn for_key(api_key: i16) -> Result<&'static dyn RequestFactory> {
                match ApiKey::from_i16(api_key) {
                    $( Some(ApiKey::$key) => Ok(&$factory), )+
                    _ => Err(Error::UnsupportedApiKey(api_key)),
                }
            }

            /// First flexible version of `api_key`, failing when `api_version`
            /// has no decoder.
            pub fn flexible_version(api_key: i16, api_version: i16) -> Result<i16> {
                let (supported, flexible) = match ApiKey::from_i16(api_key) {
                    $(
                        Some(ApiKey::$key) => {
                            ($factory::supports(api_version), $factory::FLEXIBLE_VERSION)
                        }
                    )+
                    _ => return Err(Error::UnsupportedApiKey(api_key)),
                };
                if !supported {
                    return Err(Error::UnsupportedApiVersion {
                        api_key,
                        api_version,
                    });
                }
                Ok(flexible)
            }
        }
    };
}

/// Top level factory, dispatching on the api key.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestTypeFactory;

impl RequestFactory for RequestTypeFactory {
    fn produce(&self, key_version: &RequestKeyVersion) -> Result<RequestBody> {
        let body = Self::for_key(key_version.api_key)?.produce(key_version)?;
        tracing::debug!(
            "Selected decoder for api key {} version {}",
            key_version.api_key,
            key_version.api_version
        );
        Ok(body)
    }
}

request_bodies! {
    Produce, produce => ProduceRequestFactory {
        0 => ProduceRequestV0,
        1 => ProduceRequestV1,
        2 => ProduceRequestV2,
        3 => ProduceRequestV3,
        4 => ProduceRequestV4,
        5 => ProduceRequestV5,
        6 => ProduceRequestV6,
        7 => ProduceRequestV7,
        8 => ProduceRequestV8,
        9 => ProduceRequestV9,
    }
    Fetch, fetch => FetchRequestFactory {
        0 => FetchRequestV0,
        1 => FetchRequestV1,
        2 => FetchRequestV2,
        3 => FetchRequestV3,
        4 => FetchRequestV4,
        5 => FetchRequestV5,
        6 => FetchRequestV6,
        7 => FetchRequestV7,
        8 => FetchRequestV8,
        9 => FetchRequestV9,
        10 => FetchRequestV10,
        11 => FetchRequestV11,
        12 => FetchRequestV12,
    }
    ListOffsets, list_offsets => ListOffsetsRequestFactory {
        0 => ListOffsetsRequestV0,
        1 => ListOffsetsRequestV1,
        2 => ListOffsetsRequestV2,
        3 => ListOffsetsRequestV3,
        4 => ListOffsetsRequestV4,
        5 => ListOffsetsRequestV5,
        6 => ListOffsetsRequestV6,
        7 => ListOffsetsRequestV7,
    }
    Metadata, metadata => MetadataRequestFactory {
        0 => MetadataRequestV0,
        1 => MetadataRequestV1,
        2 => MetadataRequestV2,
        3 => MetadataRequestV3,
        4 => MetadataRequestV4,
        5 => MetadataRequestV5,
        6 => MetadataRequestV6,
        7 => MetadataRequestV7,
        8 => MetadataRequestV8,
        9 => MetadataRequestV9,
        10 => MetadataRequestV10,
        11 => MetadataRequestV11,
        12 => MetadataRequestV12,
    }
    OffsetCommit, offset_commit => OffsetCommitRequestFactory {
        0 => OffsetCommitRequestV0,
        1 => OffsetCommitRequestV1,
        2 => OffsetCommitRequestV2,
        3 => OffsetCommitRequestV3,
        4 => OffsetCommitRequestV4,
        5 => OffsetCommitRequestV5,
        6 => OffsetCommitRequestV6,
        7 => OffsetCommitRequestV7,
        8 => OffsetCommitRequestV8,
    }
    OffsetFetch, offset_fetch => OffsetFetchRequestFactory {
        0 => OffsetFetchRequestV0,
        1 => OffsetFetchRequestV1,
        2 => OffsetFetchRequestV2,
        3 => OffsetFetchRequestV3,
        4 => OffsetFetchRequestV4,
        5 => OffsetFetchRequestV5,
        6 => OffsetFetchRequestV6,
        7 => OffsetFetchRequestV7,
        8 => OffsetFetchRequestV8,
    }
    CreateTopics, create_topics => CreateTopicsRequestFactory {
        0 => CreateTopicsRequestV0,
        1 => CreateTopicsRequestV1,
        2 => CreateTopicsRequestV2,
        3 => CreateTopicsRequestV3,
        4 => CreateTopicsRequestV4,
        5 => CreateTopicsRequestV5,
        6 => CreateTopicsRequestV6,
        7 => CreateTopicsRequestV7,
    }
    DeleteTopics, delete_topics => DeleteTopicsRequestFactory {
        0 => DeleteTopicsRequestV0,
        1 => DeleteTopicsRequestV1,
        2 => DeleteTopicsRequestV2,
        3 => DeleteTopicsRequestV3,
        4 => DeleteTopicsRequestV4,
        5 => DeleteTopicsRequestV5,
        6 => DeleteTopicsRequestV6,
    }
    CreatePartitions, create_partitions => CreatePartitionsRequestFactory {
        0 => CreatePartitionsRequestV0,
        1 => CreatePartitionsRequestV1,
        2 => CreatePartitionsRequestV2,
        3 => CreatePartitionsRequestV3,
    }
}
