use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use criterion::*;
use kafka_proxy_codec::prelude::*;

const BROKERS: i32 = 30;

// Metadata v1 with BROKERS brokers and no topics
fn metadata_v1() -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_i32(BROKERS);
    for id in 0..BROKERS {
        let host = format!("kafka-{}.internal", id);
        buf.put_i32(id);
        buf.put_i16(host.len() as i16);
        buf.put_slice(host.as_bytes());
        buf.put_i32(9092);
        buf.put_i16(-1);
    }
    buf.put_i32(0);
    buf.put_i32(0);
    buf.freeze()
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut mapper = StaticAddressMapper::new();
    for id in 0..BROKERS {
        mapper.add(
            (format!("kafka-{}.internal", id), 9092),
            ("proxy.example.com", 32400 + id),
        );
    }
    let modifier = get_response_modifier(3, 1, Arc::new(mapper))
        .unwrap()
        .unwrap();
    let body = metadata_v1();

    let mut rewrite_group = c.benchmark_group("rewrite");
    rewrite_group.throughput(Throughput::Bytes(body.len() as u64));
    rewrite_group.bench_with_input(
        BenchmarkId::new("metadata_v1", body.len()),
        &body,
        |b, body| b.iter(|| modifier.apply(body.clone()).unwrap()),
    );
    rewrite_group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
