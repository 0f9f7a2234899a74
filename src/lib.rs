//! # Kafka proxy codec
//! The Kafka wire protocol, as much of it as a TLS-terminating proxy needs.
//!
//! A proxy that sits between Kafka clients and brokers has two jobs this
//! crate helps with:
//! - look into requests to learn which topics and consumer groups they
//!   touch, so they can be authorized;
//! - rewrite the broker endpoints in Metadata and FindCoordinator responses,
//!   so clients keep connecting through the proxy.
//!
//! Request bytes are still forwarded as received; decoding them is read
//! only.
//!
//! ## Table of contents
//! - [Inspecting requests](#inspecting-requests)
//! - [Rewriting responses](#rewriting-responses)
//! - [Resources](#resources)
//!
//! ## Inspecting requests
//! Read a frame with [`read_frame`](prelude::read_frame), peek at its
//! [`RequestKeyVersion`](prelude::RequestKeyVersion) to pick the header
//! version, then decode it:
//! ```rust
//! use bytes::Bytes;
//! use kafka_proxy_codec::prelude::*;
//!
//! // OffsetCommit v0 from client "rust", group "g", topic "t"
//! let frame = Bytes::from_static(&[
//!     0, 0, 0, 42, 0, 8, 0, 0, 0, 0, 0, 5, 0, 4, b'r', b'u', b's', b't', 0, 1, b'g', 0, 0, 0,
//!     1, 0, 1, b't', 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 9, 255, 255,
//! ]);
//! let key_version = RequestKeyVersion::decode(&frame).unwrap();
//! assert_eq!(key_version.request_header_version().unwrap(), 1);
//!
//! let request = Request::decode(frame).unwrap();
//! assert_eq!(request.topics(), vec!["t".to_string()]);
//! assert_eq!(request.consumer_groups(), vec!["g".to_string()]);
//! ```
//!
//! Api keys without a decoder are reported as
//! [`Error::UnsupportedApiKey`](prelude::Error::UnsupportedApiKey); that
//! means the request could not be inspected, not that it is harmless.
//!
//! ## Rewriting responses
//! See [`rewrite`](prelude::ResponseModifier) and
//! [`get_response_modifier`](prelude::get_response_modifier).
//!
//! ## Resources
//! - [Kafka Protocol Spec](https://kafka.apache.org/protocol.html)
//! - [Confluence Docs](https://cwiki.apache.org/confluence/display/KAFKA/A+Guide+To+The+Kafka+Protocol)

mod config;
mod encode;
mod error;
mod network;
mod parser;
mod protocol;
mod rewrite;
mod schema;
mod tagged_fields;

pub mod prelude {
    //! Main export of various structures and methods
    //!
    //! For the lower layers, the primitive codec lives in [`encode`] and
    //! [`parser`], the schema engine in [`schema`] and every request and
    //! response layout in [`protocol`].
    pub use crate::config::{parse_endpoint, BrokerMapping, CodecConfig};
    pub use crate::encode::{encode, ToByte};
    pub use crate::error::{Error, Result};
    pub use crate::network::{frame, read_frame, read_request, read_response, write_frame};
    pub use crate::parser::{decode, Decoder, FromByte};
    pub use crate::protocol::{
        ApiKey, ProtocolBody, Request, RequestBody, RequestFactory, RequestKeyVersion,
        RequestTypeFactory, RequestV2, ResponseHeader, TopicsAndGroups,
    };
    pub use crate::rewrite::{
        get_response_modifier, AddressMapper, ResponseModifier, StaticAddressMapper,
    };
    pub use crate::tagged_fields::{TaggedField, TaggedFields};

    pub use bytes;

    pub mod encode {
        pub use crate::encode::*;
    }

    pub mod parser {
        pub use crate::parser::*;
    }

    pub mod schema {
        pub use crate::schema::*;
    }

    pub mod protocol {
        pub use crate::protocol::*;
    }
}
