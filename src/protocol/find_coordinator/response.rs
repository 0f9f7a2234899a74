//! Schemas of the Find Coordinator response, one per supported version.
//!
//! ### Protocol Def
//! ```text
//! FindCoordinator Response (Version: 0-3) => throttle_time_ms error_code error_message node_id host port TAG_BUFFER
//!   throttle_time_ms => INT32                (v1+)
//!   error_code => INT16
//!   error_message => NULLABLE_STRING         (v1+)
//!   node_id => INT32
//!   host => STRING
//!   port => INT32
//!
//! FindCoordinator Response (Version: 4) => throttle_time_ms [coordinators] TAG_BUFFER
//!   throttle_time_ms => INT32
//!   coordinators => key node_id host port error_code error_message TAG_BUFFER
//!     key => COMPACT_STRING
//!     node_id => INT32
//!     host => COMPACT_STRING
//!     port => INT32
//!     error_code => INT16
//!     error_message => COMPACT_NULLABLE_STRING
//! ```
//!
//! Up to version 3 the endpoint fields are grouped under a single
//! `coordinator` struct so the rewriter can treat them like a broker entry.
//! Version 3 is the first flexible version.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::schema::{Field, FieldType, Schema};

pub const FLEXIBLE_VERSION: i16 = 3;
pub const MAX_VERSION: i16 = 4;

/// The single coordinator endpoint of versions 0 to 3.
pub const COORDINATOR: &str = "coordinator";
/// The coordinator list of version 4 and later.
pub const COORDINATORS: &str = "coordinators";

static SCHEMAS: Lazy<Vec<Arc<Schema>>> =
    Lazy::new(|| (0..=MAX_VERSION).map(|v| Arc::new(build(v))).collect());

/// The response schema for `version`, if it is supported.
pub fn response_schema(version: i16) -> Option<&'static Arc<Schema>> {
    usize::try_from(version).ok().and_then(|v| SCHEMAS.get(v))
}

fn build(version: i16) -> Schema {
    let flexible = version >= FLEXIBLE_VERSION;
    let (string, nullable_string) = if flexible {
        (FieldType::CompactString, FieldType::CompactNullableString)
    } else {
        (FieldType::String, FieldType::NullableString)
    };

    let mut response = vec![];
    if version >= 1 {
        response.push(Field::new("throttle_time_ms", FieldType::Int32));
    }

    if version >= 4 {
        let coordinator = vec![
            Field::new("key", string.clone()),
            Field::new("node_id", FieldType::Int32),
            Field::new("host", string),
            Field::new("port", FieldType::Int32),
            Field::new("error_code", FieldType::Int16),
            Field::new("error_message", nullable_string),
            Field::new("_tagged_fields", FieldType::TaggedFields),
        ];
        response.push(Field::new(
            COORDINATORS,
            FieldType::compact_array(FieldType::structure(Schema::new(
                "Coordinator",
                coordinator,
            ))),
        ));
    } else {
        response.push(Field::new("error_code", FieldType::Int16));
        if version >= 1 {
            response.push(Field::new("error_message", nullable_string));
        }
        let coordinator = vec![
            Field::new("node_id", FieldType::Int32),
            Field::new("host", string),
            Field::new("port", FieldType::Int32),
        ];
        response.push(Field::new(
            COORDINATOR,
            FieldType::structure(Schema::new("Coordinator", coordinator)),
        ));
    }

    if flexible {
        response.push(Field::new("_tagged_fields", FieldType::TaggedFields));
    }

    Schema::new("FindCoordinatorResponse", response)
}
