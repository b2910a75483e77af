use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use radius_proto::auth::generate_request_authenticator;
use radius_proto::dictionary::StandardDictionary;
use radius_proto::random::SecureRandomProvider;
use radius_proto::{Attribute, AttributeType, Code, Packet, PacketCodec};
use std::sync::Arc;

fn codec() -> PacketCodec {
    PacketCodec::new(Arc::new(StandardDictionary), Arc::new(SecureRandomProvider))
}

fn create_test_packet(num_attributes: usize) -> Packet {
    let mut packet = Packet::new(Code::AccessRequest, 1, [0u8; 16]);

    packet.add_attribute(
        Attribute::string(AttributeType::UserName as u8, "testuser")
            .expect("Failed to create User-Name attribute"),
    );
    packet.add_attribute(
        Attribute::new(AttributeType::UserPassword as u8, b"testpassword".to_vec())
            .expect("Failed to create User-Password attribute"),
    );

    for i in 0..num_attributes {
        let attr_value = format!("attribute_{}", i);
        if let Ok(attr) = Attribute::string(AttributeType::ReplyMessage as u8, &attr_value) {
            packet.add_attribute(attr);
        }
    }

    packet
}

fn bench_encode_request(c: &mut Criterion) {
    let codec = codec();
    let mut group = c.benchmark_group("encode_request");

    for num_attrs in [0, 5, 10, 20].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_attrs),
            num_attrs,
            |b, &num_attrs| {
                let packet = create_test_packet(num_attrs);
                let auth = generate_request_authenticator();
                b.iter(|| {
                    codec
                        .encode_request(black_box(&packet), b"testing123", auth)
                        .expect("Failed to encode request")
                });
            },
        );
    }

    group.finish();
}

fn bench_decode_request(c: &mut Criterion) {
    let codec = codec();
    let mut group = c.benchmark_group("decode_request");

    for num_attrs in [0, 5, 10, 20].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_attrs),
            num_attrs,
            |b, &num_attrs| {
                let packet = create_test_packet(num_attrs);
                let auth = generate_request_authenticator();
                let encoded = codec
                    .encode_request(&packet, b"testing123", auth)
                    .expect("Failed to encode request");
                b.iter(|| {
                    codec
                        .decode_request(black_box(&encoded.bytes), b"testing123")
                        .expect("Failed to decode request")
                });
            },
        );
    }

    group.finish();
}

fn bench_response_roundtrip(c: &mut Criterion) {
    let codec = codec();
    let request_auth = generate_request_authenticator();

    let mut reply = Packet::new(Code::AccessAccept, 0, [0u8; 16]);
    reply.add_attribute(Attribute::string(AttributeType::ReplyMessage as u8, "ok").unwrap());
    let encoded = codec
        .encode_response(&reply, b"testing123", 1, &request_auth)
        .expect("Failed to encode response");

    c.bench_function("decode_response", |b| {
        b.iter(|| {
            codec
                .decode_response(black_box(&encoded), b"testing123", &request_auth)
                .expect("Failed to decode response")
        });
    });
}

criterion_group!(
    benches,
    bench_encode_request,
    bench_decode_request,
    bench_response_roundtrip
);
criterion_main!(benches);
