//! Settings for the codec and the frame helpers around it.
//!
//! ### Example
//! ```rust
//! use kafka_proxy_codec::prelude::*;
//!
//! let config = CodecConfig::from_json(
//!     r#"{
//!         "max_request_size": 1048576,
//!         "broker_mappings": [
//!             { "broker": "kafka-0.internal:9092", "advertised": "proxy.example.com:32400" }
//!         ]
//!     }"#,
//! )
//! .unwrap();
//! let mapper = config.address_mapper().unwrap();
//! assert_eq!(
//!     mapper.map("kafka-0.internal", 9092).unwrap(),
//!     ("proxy.example.com".to_string(), 32400)
//! );
//! ```
use std::env;

use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rewrite::StaticAddressMapper;

/// Kafka's default `socket.request.max.bytes`.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 104_857_600;
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 104_857_600;

pub const ENV_MAX_REQUEST_SIZE: &str = "KAFKA_PROXY_MAX_REQUEST_SIZE";
pub const ENV_MAX_RESPONSE_SIZE: &str = "KAFKA_PROXY_MAX_RESPONSE_SIZE";
/// `broker,advertised;broker,advertised`, each side as `host:port`.
pub const ENV_BROKER_MAPPINGS: &str = "KAFKA_PROXY_BROKER_MAPPINGS";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest request frame accepted from a client.
    pub max_request_size: usize,
    /// Largest response frame accepted from a broker.
    pub max_response_size: usize,
    pub broker_mappings: Vec<BrokerMapping>,
}

/// One broker endpoint and the endpoint advertised in its place.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BrokerMapping {
    pub broker: String,
    pub advertised: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            broker_mappings: vec![],
        }
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid json: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(size) = lookup(ENV_MAX_REQUEST_SIZE) {
            config.max_request_size = parse_size(ENV_MAX_REQUEST_SIZE, &size)?;
        }
        if let Some(size) = lookup(ENV_MAX_RESPONSE_SIZE) {
            config.max_response_size = parse_size(ENV_MAX_RESPONSE_SIZE, &size)?;
        }
        if let Some(mappings) = lookup(ENV_BROKER_MAPPINGS) {
            for mapping in mappings.split(';').map(str::trim).filter(|m| !m.is_empty()) {
                let (broker, advertised) = mapping.split_once(',').ok_or_else(|| {
                    Error::Config(format!(
                        "{}: expected broker,advertised but got {:?}",
                        ENV_BROKER_MAPPINGS, mapping
                    ))
                })?;
                config.add_broker_mapping(broker.trim(), advertised.trim());
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn max_request_size(&mut self, max_request_size: usize) -> &mut Self {
        self.max_request_size = max_request_size;
        self
    }

    pub fn max_response_size(&mut self, max_response_size: usize) -> &mut Self {
        self.max_response_size = max_response_size;
        self
    }

    /// Advertise `advertised` in place of `broker`, both as `host:port`.
    pub fn add_broker_mapping(
        &mut self,
        broker: impl Into<String>,
        advertised: impl Into<String>,
    ) -> &mut Self {
        self.broker_mappings.push(BrokerMapping {
            broker: broker.into(),
            advertised: advertised.into(),
        });
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_request_size == 0 || self.max_response_size == 0 {
            return Err(Error::Config("frame size limits must be positive".into()));
        }
        for mapping in &self.broker_mappings {
            parse_endpoint(&mapping.broker)?;
            parse_endpoint(&mapping.advertised)?;
        }
        Ok(())
    }

    /// The broker mappings as an address mapper.
    pub fn address_mapper(&self) -> Result<StaticAddressMapper> {
        let mut mapper = StaticAddressMapper::new();
        for mapping in &self.broker_mappings {
            mapper.add(
                parse_endpoint(&mapping.broker)?,
                parse_endpoint(&mapping.advertised)?,
            );
        }
        Ok(mapper)
    }
}

fn parse_size(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{}: invalid size {:?}: {}", key, value, e)))
}

/// Split `host:port`. The last colon separates the port.
pub fn parse_endpoint(endpoint: &str) -> Result<(String, i32)> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| Error::Config(format!("expected host:port, got {:?}", endpoint)))?;
    if host.is_empty() {
        return Err(Error::Config(format!("missing host in {:?}", endpoint)));
    }
    let port: i32 = port
        .parse()
        .map_err(|e| Error::Config(format!("invalid port in {:?}: {}", endpoint, e)))?;
    if !(0..=65535).contains(&port) {
        return Err(Error::Config(format!(
            "port {} out of range in {:?}",
            port, endpoint
        )));
    }
    Ok((host.to_string(), port))
}
