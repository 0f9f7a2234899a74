//! Schemas of the Metadata response, one per supported version.
//!
//! ### Protocol Def
//! ```text
//! Metadata Response (Version: 0-12) => throttle_time_ms [brokers] cluster_id controller_id [topics] cluster_authorized_operations TAG_BUFFER
//!   throttle_time_ms => INT32                   (v3+)
//!   brokers => node_id host port rack TAG_BUFFER
//!     node_id => INT32
//!     host => STRING
//!     port => INT32
//!     rack => NULLABLE_STRING                   (v1+)
//!   cluster_id => NULLABLE_STRING               (v2+)
//!   controller_id => INT32                      (v1+)
//!   topics => error_code name topic_id is_internal [partitions] topic_authorized_operations TAG_BUFFER
//!     error_code => INT16
//!     name => STRING                            (nullable v12+)
//!     topic_id => UUID                          (v10+)
//!     is_internal => BOOLEAN                    (v1+)
//!     partitions => error_code partition_index leader_id leader_epoch [replica_nodes] [isr_nodes] [offline_replicas] TAG_BUFFER
//!       error_code => INT16
//!       partition_index => INT32
//!       leader_id => INT32
//!       leader_epoch => INT32                   (v7+)
//!       replica_nodes => INT32
//!       isr_nodes => INT32
//!       offline_replicas => INT32               (v5+)
//!     topic_authorized_operations => INT32      (v8+)
//!   cluster_authorized_operations => INT32      (v8-10)
//! ```
//!
//! Version 9 is the first flexible version: strings and arrays switch to
//! their compact forms and every struct ends with a tag buffer.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::schema::{Field, FieldType, Schema};

pub const FLEXIBLE_VERSION: i16 = 9;
pub const MAX_VERSION: i16 = 12;

/// Name of the broker list in every version.
pub const BROKERS: &str = "brokers";

static SCHEMAS: Lazy<Vec<Arc<Schema>>> =
    Lazy::new(|| (0..=MAX_VERSION).map(|v| Arc::new(build(v))).collect());

/// The response schema for `version`, if it is supported.
pub fn response_schema(version: i16) -> Option<&'static Arc<Schema>> {
    usize::try_from(version).ok().and_then(|v| SCHEMAS.get(v))
}

fn build(version: i16) -> Schema {
    let flexible = version >= FLEXIBLE_VERSION;
    let string = || {
        if flexible {
            FieldType::CompactString
        } else {
            FieldType::String
        }
    };
    let nullable_string = || {
        if flexible {
            FieldType::CompactNullableString
        } else {
            FieldType::NullableString
        }
    };
    let array = |inner: FieldType| {
        if flexible {
            FieldType::compact_array(inner)
        } else {
            FieldType::array(inner)
        }
    };

    let mut broker = vec![
        Field::new("node_id", FieldType::Int32),
        Field::new("host", string()),
        Field::new("port", FieldType::Int32),
    ];
    if version >= 1 {
        broker.push(Field::new("rack", nullable_string()));
    }

    let mut partition = vec![
        Field::new("error_code", FieldType::Int16),
        Field::new("partition_index", FieldType::Int32),
        Field::new("leader_id", FieldType::Int32),
    ];
    if version >= 7 {
        partition.push(Field::new("leader_epoch", FieldType::Int32));
    }
    partition.push(Field::new("replica_nodes", array(FieldType::Int32)));
    partition.push(Field::new("isr_nodes", array(FieldType::Int32)));
    if version >= 5 {
        partition.push(Field::new("offline_replicas", array(FieldType::Int32)));
    }

    let mut topic = vec![Field::new("error_code", FieldType::Int16)];
    if version >= 12 {
        topic.push(Field::new("name", nullable_string()));
    } else {
        topic.push(Field::new("name", string()));
    }
    if version >= 10 {
        topic.push(Field::new("topic_id", FieldType::Uuid));
    }
    if version >= 1 {
        topic.push(Field::new("is_internal", FieldType::Bool));
    }

    let mut response = vec![];
    if version >= 3 {
        response.push(Field::new("throttle_time_ms", FieldType::Int32));
    }

    if flexible {
        broker.push(Field::new("_tagged_fields", FieldType::TaggedFields));
        partition.push(Field::new("_tagged_fields", FieldType::TaggedFields));
    }
    response.push(Field::new(
        BROKERS,
        array(FieldType::structure(Schema::new("MetadataBroker", broker))),
    ));
    if version >= 2 {
        response.push(Field::new("cluster_id", nullable_string()));
    }
    if version >= 1 {
        response.push(Field::new("controller_id", FieldType::Int32));
    }

    topic.push(Field::new(
        "partition_metadata",
        array(FieldType::structure(Schema::new(
            "MetadataPartition",
            partition,
        ))),
    ));
    if version >= 8 {
        topic.push(Field::new("topic_authorized_operations", FieldType::Int32));
    }
    if flexible {
        topic.push(Field::new("_tagged_fields", FieldType::TaggedFields));
    }
    response.push(Field::new(
        "topic_metadata",
        array(FieldType::structure(Schema::new("MetadataTopic", topic))),
    ));

    if (8..=10).contains(&version) {
        response.push(Field::new("cluster_authorized_operations", FieldType::Int32));
    }
    if flexible {
        response.push(Field::new("_tagged_fields", FieldType::TaggedFields));
    }

    Schema::new("MetadataResponse", response)
}
