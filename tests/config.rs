use std::collections::HashMap;

use kafka_proxy_codec::prelude::*;

#[test]
fn json_config_drives_the_mapper() {
    let config = CodecConfig::from_json(
        r#"{
            "max_response_size": 4096,
            "broker_mappings": [
                { "broker": "kafka-0.internal:9092", "advertised": "proxy.example.com:32400" },
                { "broker": "kafka-1.internal:9092", "advertised": "proxy.example.com:32401" }
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(config.max_response_size, 4096);
    assert_eq!(config.max_request_size, 104_857_600);

    let mapper = config.address_mapper().unwrap();
    assert_eq!(mapper.len(), 2);
    assert_eq!(
        mapper.map("kafka-1.internal", 9092).unwrap(),
        ("proxy.example.com".to_string(), 32401)
    );
    assert!(matches!(
        mapper.map("kafka-2.internal", 9092),
        Err(Error::AddressMapping(_))
    ));
}

#[test]
fn environment_style_lookup() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("KAFKA_PROXY_MAX_REQUEST_SIZE", " 65536 "),
        (
            "KAFKA_PROXY_BROKER_MAPPINGS",
            "kafka-0:9092,edge:443;kafka-1:9092,edge:444",
        ),
    ]);
    let config = CodecConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
    assert_eq!(config.max_request_size, 65536);

    let mut expected = CodecConfig::new();
    expected
        .max_request_size(65536)
        .add_broker_mapping("kafka-0:9092", "edge:443")
        .add_broker_mapping("kafka-1:9092", "edge:444");
    assert_eq!(config, expected);
}

#[test]
fn bad_settings_are_config_errors() {
    let vars: HashMap<&str, &str> = HashMap::from([("KAFKA_PROXY_MAX_REQUEST_SIZE", "lots")]);
    let err = CodecConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("KAFKA_PROXY_MAX_REQUEST_SIZE"));

    let mut config = CodecConfig::new();
    config.add_broker_mapping("kafka-0:9092", "edge");
    assert!(config.validate().is_err());
    assert!(config.address_mapper().is_err());
}
