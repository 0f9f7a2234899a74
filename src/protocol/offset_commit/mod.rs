//! Commit a set of offsets for a consumer group.

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

    // group "Big Dogs", member "Da Boss", offset 300 on purchases/0
    const V2: [u8; 64] = [
        0, 8, 66, 105, 103, 32, 68, 111, 103, 115, 0, 0, 0, 1, 0, 7, 68, 97, 32, 66, 111, 115, 115,
        0, 0, 0, 0, 0, 0, 7, 208, 0, 0, 0, 1, 0, 9, 112, 117, 114, 99, 104, 97, 115, 101, 115, 0,
        0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 44, 255, 255,
    ];

    #[test]
    fn parse_v2() {
        let req = parse_all(OffsetCommitRequestV2::decode, Bytes::from_static(&V2)).unwrap();
        assert_eq!(req.group_id, "Big Dogs");
        assert_eq!(req.generation_id_or_member_epoch, 1);
        assert_eq!(req.member_id, "Da Boss");
        assert_eq!(req.retention_time_ms, 2000);
        assert_eq!(req.topics[0].partitions[0].committed_offset, 300);
        assert_eq!(req.topics[0].partitions[0].committed_metadata, None);
        assert_eq!(req.topics(), vec!["purchases".to_string()]);
        assert_eq!(req.consumer_groups(), vec!["Big Dogs".to_string()]);
        assert_eq!(encode(&req).unwrap().as_ref(), V2);

        // v3 and v4 share the layout
        let v4 = parse_all(OffsetCommitRequestV4::decode, Bytes::from_static(&V2)).unwrap();
        assert_eq!(v4.0, req.0);
    }

    #[test]
    fn parse_v0() {
        let buf = [
            0, 1, b'g', // group_id
            0, 0, 0, 1, // topics
            0, 1, b't', // name
            0, 0, 0, 1, // partitions
            0, 0, 0, 0, // partition_index
            0, 0, 0, 0, 0, 0, 0, 9, // committed_offset
            0, 0, // committed_metadata
        ];
        let req = parse_all(OffsetCommitRequestV0::decode, Bytes::copy_from_slice(&buf)).unwrap();
        assert_eq!(req.consumer_groups(), vec!["g".to_string()]);
        assert_eq!(req.topics(), vec!["t".to_string()]);
        assert_eq!(
            req.topics[0].partitions[0].committed_metadata.as_deref(),
            Some("")
        );
        assert_eq!(encode(&req).unwrap().as_ref(), buf);
    }

    #[test]
    fn parse_v1_commit_timestamp() {
        let buf = [
            0, 1, b'g', // group_id
            0, 0, 0, 1, // generation_id
            0, 1, b'm', // member_id
            0, 0, 0, 1, // topics
            0, 1, b't', // name
            0, 0, 0, 1, // partitions
            0, 0, 0, 0, // partition_index
            0, 0, 0, 0, 0, 0, 0, 9, // committed_offset
            0, 0, 0, 0, 0, 0, 1, 0, // commit_timestamp
            255, 255, // committed_metadata
        ];
        let req = parse_all(OffsetCommitRequestV1::decode, Bytes::copy_from_slice(&buf)).unwrap();
        assert_eq!(req.topics[0].partitions[0].commit_timestamp, 256);
        assert_eq!(encode(&req).unwrap().as_ref(), buf);
    }

    #[test]
    fn parse_v8() {
        let buf = [
            2, b'g', // group_id
            0, 0, 0, 1, // generation_id
            2, b'm', // member_id
            0, // group_instance_id
            2, // topics
            2, b't', // name
            2, // partitions
            0, 0, 0, 0, // partition_index
            0, 0, 0, 0, 0, 0, 0, 9, // committed_offset
            255, 255, 255, 255, // committed_leader_epoch
            1, // committed_metadata
            0, // partition tags
            0, // topic tags
            0, // request tags
        ];
        let req = parse_all(OffsetCommitRequestV8::decode, Bytes::copy_from_slice(&buf)).unwrap();
        assert_eq!(req.group_instance_id, None);
        assert_eq!(req.topics[0].partitions[0].committed_leader_epoch, -1);
        assert_eq!(req.consumer_groups(), vec!["g".to_string()]);
        assert_eq!(encode(&req).unwrap().as_ref(), buf);
    }
}
