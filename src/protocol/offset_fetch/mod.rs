//! Fetch a set of offsets for a consumer group.

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

    // group "Big Dogs", partition 1 of purchases
    const V2: [u8; 33] = [
        0, 8, 66, 105, 103, 32, 68, 111, 103, 115, 0, 0, 0, 1, 0, 9, 112, 117, 114, 99, 104, 97,
        115, 101, 115, 0, 0, 0, 1, 0, 0, 0, 1,
    ];

    #[test]
    fn parse_v2() {
        let req = parse_all(OffsetFetchRequestV2::decode, Bytes::from_static(&V2)).unwrap();
        assert_eq!(req.group_id.as_deref(), Some("Big Dogs"));
        let topics = req.topics.as_ref().unwrap();
        assert_eq!(topics[0].name, "purchases");
        assert_eq!(topics[0].partition_indexes, vec![1]);
        assert_eq!(req.topics(), vec!["purchases".to_string()]);
        assert_eq!(req.consumer_groups(), vec!["Big Dogs".to_string()]);
        assert_eq!(encode(&req).unwrap().as_ref(), V2);

        // v0 and v1 have the same layout
        let v1 = parse_all(OffsetFetchRequestV1::decode, Bytes::from_static(&V2)).unwrap();
        assert_eq!(v1.0, req.0);
    }

    #[test]
    fn null_topics() {
        let buf = [0, 1, b'g', 255, 255, 255, 255];
        let req = parse_all(OffsetFetchRequestV3::decode, Bytes::copy_from_slice(&buf)).unwrap();
        assert_eq!(req.topics, None);
        assert!(req.topics().is_empty());
        assert_eq!(req.consumer_groups(), vec!["g".to_string()]);
        assert_eq!(encode(&req).unwrap().as_ref(), buf);

        // before v2 the array is not nullable and null reads as empty
        let req = parse_all(OffsetFetchRequestV1::decode, Bytes::copy_from_slice(&buf)).unwrap();
        assert_eq!(req.topics, Some(vec![]));
        assert_eq!(encode(&req).unwrap().as_ref(), [0, 1, b'g', 0, 0, 0, 0]);
    }

    #[test]
    fn parse_v7() {
        let buf = [
            2, b'g', // group_id
            2, // topics
            2, b't', // name
            3, 0, 0, 0, 0, 0, 0, 0, 1, // partition_indexes
            0, // topic tags
            1, // require_stable
            0, // tags
        ];
        let req = parse_all(OffsetFetchRequestV7::decode, Bytes::copy_from_slice(&buf)).unwrap();
        assert!(req.require_stable);
        assert_eq!(req.topics.as_ref().unwrap()[0].partition_indexes, vec![0, 1]);
        assert_eq!(encode(&req).unwrap().as_ref(), buf);
    }

    #[test]
    fn parse_v8_groups() {
        let buf = [
            3, // groups
            3, b'g', b'1', // group_id
            2, // topics
            2, b'a', // name
            2, 0, 0, 0, 0, // partition_indexes
            0, // topic tags
            0, // group tags
            3, b'g', b'2', // group_id
            0, // null topics
            0, // group tags
            0, // require_stable
            0, // tags
        ];
        let req = parse_all(OffsetFetchRequestV8::decode, Bytes::copy_from_slice(&buf)).unwrap();
        assert_eq!(
            req.consumer_groups(),
            vec!["g1".to_string(), "g2".to_string()]
        );
        assert_eq!(req.topics(), vec!["a".to_string()]);
        assert_eq!(req.groups[1].topics, None);
        assert_eq!(encode(&req).unwrap().as_ref(), buf);
    }

    #[test]
    fn v8_without_groups() {
        let buf = [1, 0, 0];
        let req = parse_all(OffsetFetchRequestV8::decode, Bytes::copy_from_slice(&buf)).unwrap();
        assert_eq!(req.group_id, None);
        assert!(req.groups.is_empty());
        assert!(req.consumer_groups().is_empty());
        assert!(req.topics().is_empty());
        assert_eq!(encode(&req).unwrap().as_ref(), buf);

        // an empty group id is still a group before v8
        let buf = [1, 0, 0, 0];
        let req = parse_all(OffsetFetchRequestV7::decode, Bytes::copy_from_slice(&buf)).unwrap();
        assert_eq!(req.consumer_groups(), vec![String::new()]);
    }
}
