//! Broker address rewriting for Metadata and FindCoordinator responses.
//!
//! Clients learn where to connect from these two responses, so a proxy has
//! to replace every broker endpoint in them with one of its own. Host names
//! change length when they are rewritten, which moves every offset after
//! them. Instead of patching bytes in place, a [`ResponseModifier`] decodes
//! the whole response with the schema of its version, swaps the endpoints
//! in the decoded [`Struct`] and encodes a fresh buffer from it.
//!
//! ### Example
//! ```rust
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use kafka_proxy_codec::prelude::*;
//!
//! let mapper = |host: &str, port: i32| -> Result<(String, i32)> {
//!     Ok((format!("proxy-{}", host), port + 1000))
//! };
//! let modifier = get_response_modifier(3, 0, Arc::new(mapper)).unwrap().unwrap();
//!
//! // one broker 1 at "b":9092, no topics
//! let body = Bytes::from_static(&[0, 0, 0, 1, 0, 0, 0, 1, 0, 1, b'b', 0, 0, 35, 132, 0, 0, 0, 0]);
//! let rewritten = modifier.apply(body).unwrap();
//! assert_eq!(&rewritten[8..17], b"\0\x07proxy-b");
//!
//! // responses without endpoints pass through untouched
//! assert!(get_response_modifier(0, 9, Arc::new(mapper)).unwrap().is_none());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use nombytes::NomBytes;

use crate::{
    encode::{PacketEncoder, RealEncoder},
    error::{Error, Result},
    protocol::{
        find_coordinator::response as find_coordinator, metadata::response as metadata, ApiKey,
        ResponseHeader, Versioned,
    },
    schema::{decode_schema, encode_schema, Schema, Struct, Value},
};

/// Maps a broker endpoint to the endpoint clients should use instead.
pub trait AddressMapper: Send + Sync {
    fn map(&self, host: &str, port: i32) -> Result<(String, i32)>;
}

impl<F> AddressMapper for F
where
    F: Fn(&str, i32) -> Result<(String, i32)> + Send + Sync,
{
    fn map(&self, host: &str, port: i32) -> Result<(String, i32)> {
        self(host, port)
    }
}

/// A fixed table of broker endpoints and their advertised replacements.
///
/// Endpoints missing from the table are errors, except the empty host
/// brokers use as a placeholder (for instance while no coordinator is
/// available), which passes through as is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticAddressMapper {
    mappings: HashMap<(String, i32), (String, i32)>,
}

impl StaticAddressMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise `advertised` in place of `broker`.
    pub fn add(
        &mut self,
        broker: (impl Into<String>, i32),
        advertised: (impl Into<String>, i32),
    ) -> &mut Self {
        self.mappings.insert(
            (broker.0.into(), broker.1),
            (advertised.0.into(), advertised.1),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl AddressMapper for StaticAddressMapper {
    fn map(&self, host: &str, port: i32) -> Result<(String, i32)> {
        if host.is_empty() {
            return Ok((String::new(), port));
        }
        self.mappings
            .get(&(host.to_string(), port))
            .cloned()
            .ok_or_else(|| Error::AddressMapping(format!("no mapping for {}:{}", host, port)))
    }
}

/// Rewrites the broker endpoints of one (api key, api version) of response.
#[derive(Clone)]
pub struct ResponseModifier {
    api_key: ApiKey,
    api_version: i16,
    schema: &'static Arc<Schema>,
    mapper: Arc<dyn AddressMapper>,
}

impl fmt::Debug for ResponseModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseModifier")
            .field("api_key", &self.api_key)
            .field("api_version", &self.api_version)
            .field("schema", &self.schema.name())
            .finish()
    }
}

/// The modifier for responses to `api_key` at `api_version`.
///
/// Returns `Ok(None)` for api keys whose responses carry no broker endpoint;
/// those are forwarded unmodified. A Metadata or FindCoordinator version
/// without a schema is an error.
pub fn get_response_modifier(
    api_key: i16,
    api_version: i16,
    mapper: Arc<dyn AddressMapper>,
) -> Result<Option<ResponseModifier>> {
    let (api_key, schema) = match ApiKey::from_i16(api_key) {
        Some(ApiKey::Metadata) => (ApiKey::Metadata, metadata::response_schema(api_version)),
        Some(ApiKey::FindCoordinator) => (
            ApiKey::FindCoordinator,
            find_coordinator::response_schema(api_version),
        ),
        _ => return Ok(None),
    };
    let schema = schema.ok_or(Error::UnsupportedApiVersion {
        api_key: api_key as i16,
        api_version,
    })?;
    Ok(Some(ResponseModifier {
        api_key,
        api_version,
        schema,
        mapper,
    }))
}

impl ResponseModifier {
    pub fn api_key(&self) -> ApiKey {
        self.api_key
    }

    pub fn api_version(&self) -> i16 {
        self.api_version
    }

    /// Header version of the responses this modifier handles.
    pub fn response_header_version(&self) -> i16 {
        let flexible = match self.api_key {
            ApiKey::Metadata => metadata::FLEXIBLE_VERSION,
            _ => find_coordinator::FLEXIBLE_VERSION,
        };
        if self.api_version >= flexible {
            1
        } else {
            0
        }
    }

    /// Rewrite a response body (everything after the response header).
    ///
    /// Nothing is produced when any endpoint fails to map.
    pub fn apply(&self, body: Bytes) -> Result<Bytes> {
        self.rewrite(body).map_err(|err| {
            tracing::error!(
                "ERROR: Failed to rewrite {:?} v{} response: {}",
                self.api_key,
                self.api_version,
                err
            );
            err
        })
    }

    /// Rewrite a response frame without its length prefix: the response
    /// header followed by the body.
    pub fn apply_response(&self, frame: Bytes) -> Result<Bytes> {
        let header_version = self.response_header_version();
        let (body, header) = parse_header(NomBytes::new(frame), header_version)?;
        let body = self.apply(body.into_bytes())?;

        let mut pe = RealEncoder::with_capacity(body.len() + 8);
        header.encode_version(&mut pe, header_version)?;
        pe.put_raw_bytes(&body);
        Ok(pe.into_inner().freeze())
    }

    fn rewrite(&self, body: Bytes) -> Result<Bytes> {
        let mut response = decode_schema(body, self.schema)?;
        let changed = match self.api_key {
            ApiKey::FindCoordinator if self.api_version < 4 => {
                self.rewrite_endpoint(response.get_struct_mut(find_coordinator::COORDINATOR)?)?
            }
            ApiKey::FindCoordinator => {
                self.rewrite_all(response.get_array_mut(find_coordinator::COORDINATORS)?)?
            }
            _ => self.rewrite_all(response.get_array_mut(metadata::BROKERS)?)?,
        };
        tracing::trace!(
            "Rewrote {} endpoints of {:?} v{} response",
            changed,
            self.api_key,
            self.api_version
        );
        encode_schema(&response, self.schema)
    }

    fn rewrite_all(&self, endpoints: &mut [Value]) -> Result<usize> {
        let mut changed = 0;
        for endpoint in endpoints.iter_mut() {
            match endpoint {
                Value::Struct(endpoint) => changed += self.rewrite_endpoint(endpoint)?,
                other => {
                    return Err(Error::SchemaDecoding(format!(
                        "expected a broker struct, found {}",
                        other.kind()
                    )))
                }
            }
        }
        Ok(changed)
    }

    fn rewrite_endpoint(&self, endpoint: &mut Struct) -> Result<usize> {
        let host = endpoint.get_str("host")?.to_string();
        let port = endpoint.get_i32("port")?;
        let (new_host, new_port) = self.mapper.map(&host, port)?;
        if new_host == host && new_port == port {
            return Ok(0);
        }

        tracing::debug!(
            "Rewriting broker {}:{} to {}:{}",
            host,
            port,
            new_host,
            new_port
        );
        if new_host != host {
            endpoint.replace("host", Value::Str(new_host))?;
        }
        if new_port != port {
            endpoint.replace("port", Value::Int32(new_port))?;
        }
        Ok(1)
    }
}

fn parse_header(s: NomBytes, version: i16) -> Result<(NomBytes, ResponseHeader)> {
    Ok(ResponseHeader::parse_version(s, version)?)
}
