//! Locate the current coordinator of a group.
//!
//! Only the response is of interest here: its coordinator endpoint has to
//! be rewritten the same way as the broker list of a metadata response.

pub mod response;

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::response::*;
    use crate::schema::{decode_schema, encode_schema, Value};

    // coordinator 1 at localhost:9092
    const V0: [u8; 21] = [
        0, 0, 0, 0, 0, 1, 0, 9, 108, 111, 99, 97, 108, 104, 111, 115, 116, 0, 0, 35, 132,
    ];

    #[test]
    fn parse_v0() {
        let schema = response_schema(0).unwrap();
        let res = decode_schema(Bytes::from_static(&V0), schema).unwrap();
        assert_eq!(res.get_i16("error_code").unwrap(), 0);

        let coordinator = res.get_struct(COORDINATOR).unwrap();
        assert_eq!(coordinator.get_i32("node_id").unwrap(), 1);
        assert_eq!(coordinator.get_str("host").unwrap(), "localhost");
        assert_eq!(coordinator.get_i32("port").unwrap(), 9092);

        assert_eq!(encode_schema(&res, schema).unwrap().as_ref(), V0);
    }

    #[test]
    fn parse_v1() {
        let buf = [
            0, 0, 0, 0, // throttle_time_ms
            0, 15, // error_code
            0, 4, b'o', b'o', b'p', b's', // error_message
            255, 255, 255, 255, // node_id
            0, 0, // host
            255, 255, 255, 255, // port
        ];
        let schema = response_schema(1).unwrap();
        let res = decode_schema(Bytes::copy_from_slice(&buf), schema).unwrap();
        assert_eq!(res.get_nullable_str("error_message").unwrap(), Some("oops"));
        assert_eq!(res.get_struct(COORDINATOR).unwrap().get_str("host").unwrap(), "");
        assert_eq!(encode_schema(&res, schema).unwrap().as_ref(), buf);
    }

    #[test]
    fn parse_v4() {
        let buf = [
            0, 0, 0, 0, // throttle_time_ms
            3, // coordinators
            2, b'a', 0, 0, 0, 1, 2, b'h', 0, 0, 0, 1, 0, 0, 0, 0, // key a on h:1
            2, b'b', 0, 0, 0, 2, 2, b'k', 0, 0, 0, 2, 0, 0, 0, 0, // key b on k:2
            0, // tags
        ];
        let schema = response_schema(4).unwrap();
        let res = decode_schema(Bytes::copy_from_slice(&buf), schema).unwrap();
        let coordinators = res.get_array(COORDINATORS).unwrap();
        assert_eq!(coordinators.len(), 2);
        match &coordinators[1] {
            Value::Struct(c) => {
                assert_eq!(c.get_str("key").unwrap(), "b");
                assert_eq!(c.get_str("host").unwrap(), "k");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(res.get_struct(COORDINATOR).is_err());
        assert_eq!(encode_schema(&res, schema).unwrap().as_ref(), buf);
    }

    #[test]
    fn schema_versions() {
        for version in 0..=3 {
            let schema = response_schema(version).unwrap();
            assert!(schema.index_of(COORDINATOR).is_some());
        }
        assert!(response_schema(4).unwrap().index_of(COORDINATORS).is_some());
        assert!(response_schema(5).is_none());
    }
}
