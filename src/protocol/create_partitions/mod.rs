//! Grow the partition count of existing topics.

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

    #[test]
    fn parse_v0() {
        let buf = [
            0, 0, 0, 1, // topics
            0, 6, b'o', b'r', b'd', b'e', b'r', b's', // name
            0, 0, 0, 6, // count
            255, 255, 255, 255, // assignments
            0, 0, 39, 16, // timeout_ms
            0, // validate_only
        ];
        let req =
            parse_all(CreatePartitionsRequestV0::decode, Bytes::copy_from_slice(&buf)).unwrap();
        assert_eq!(req.topics[0].count, 6);
        assert_eq!(req.topics[0].assignments, None);
        assert_eq!(req.timeout_ms, 10000);
        assert_eq!(req.topics(), vec!["orders".to_string()]);
        assert_eq!(encode(&req).unwrap().as_ref(), buf);
    }

    #[test]
    fn parse_v2_flexible() {
        let buf = [
            2, // topics
            2, b't', // name
            0, 0, 0, 3, // count
            2, // assignments
            3, 0, 0, 0, 1, 0, 0, 0, 2, // broker_ids
            0, // assignment tags
            0, // topic tags
            0, 0, 0, 1, // timeout_ms
            1, // validate_only
            0, // tags
        ];
        let req =
            parse_all(CreatePartitionsRequestV2::decode, Bytes::copy_from_slice(&buf)).unwrap();
        let assignments = req.topics[0].assignments.as_ref().unwrap();
        assert_eq!(assignments[0].broker_ids, vec![1, 2]);
        assert!(req.validate_only);
        assert_eq!(encode(&req).unwrap().as_ref(), buf);

        // the classic layout of v1 cannot read it
        assert!(
            parse_all(CreatePartitionsRequestV1::decode, Bytes::copy_from_slice(&buf)).is_err()
        );
    }
}
