pub mod request;

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::request::*;
    use crate::{
        encode::encode,
        parser::{parse_all, FromByte},
        protocol::TopicsAndGroups,
    };

    // one partition of "tester-creation", 2s timeout
    const V3: [u8; 40] = [
        0, 0, 0, 1, 0, 15, 116, 101, 115, 116, 101, 114, 45, 99, 114, 101, 97, 116, 105, 111, 110,
        0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 7, 208, 0,
    ];

    #[test]
    fn parse_v3() {
        let req = parse_all(CreateTopicsRequestV3::decode, Bytes::from_static(&V3)).unwrap();
        assert_eq!(req.topics[0].name, "tester-creation");
        assert_eq!(req.topics[0].num_partitions, 1);
        assert_eq!(req.timeout_ms, 2000);
        assert!(!req.validate_only);
        assert_eq!(req.topics(), vec!["tester-creation".to_string()]);
        assert!(req.consumer_groups().is_empty());
        assert_eq!(encode(&req).unwrap().as_ref(), V3);

        // v0 has no validate_only, so the last byte is left over
        assert!(parse_all(CreateTopicsRequestV0::decode, Bytes::from_static(&V3)).is_err());
        let v0 = parse_all(CreateTopicsRequestV0::decode, Bytes::from_static(&V3[..39])).unwrap();
        assert_eq!(v0.0, req.0);
    }

    #[test]
    fn parse_v5_assignments_and_configs() {
        let buf = [
            2, // topics
            2, b't', // name
            255, 255, 255, 255, // num_partitions
            255, 255, // replication_factor
            2, // assignments
            0, 0, 0, 0, // partition_index
            3, 0, 0, 0, 1, 0, 0, 0, 2, // broker_ids
            0, // assignment tags
            3, // configs
            2, b'a', 2, b'1', 0, // name, value, tags
            2, b'b', 0, 0, // name, null value, tags
            0, // topic tags
            0, 0, 0, 100, // timeout_ms
            1, // validate_only
            0, // tags
        ];
        let req = parse_all(CreateTopicsRequestV5::decode, Bytes::copy_from_slice(&buf)).unwrap();
        let topic = &req.topics[0];
        assert_eq!(topic.num_partitions, -1);
        assert_eq!(topic.assignments[0].broker_ids, vec![1, 2]);
        assert_eq!(topic.configs[0].value.as_deref(), Some("1"));
        assert_eq!(topic.configs[1].value, None);
        assert!(req.validate_only);
        assert_eq!(encode(&req).unwrap().as_ref(), buf);
    }
}
