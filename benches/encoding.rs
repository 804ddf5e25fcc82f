use bacnet_codec::app::{Apdu, PduHeader};
use bacnet_codec::encoding::*;
use bacnet_codec::object::{ObjectIdentifier, ObjectType, PropertyIdentifier, PropertySchema};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const READ_PROPERTY_ACK: [u8; 17] = [
    0x30, 0x01, 0x0C, 0x0C, 0x00, 0x00, 0x00, 0x01, 0x19, 0x55, 0x3E, 0x44, 0x42, 0x90, 0x00, 0x00,
    0x3F,
];

fn mixed_payload() -> Vec<u8> {
    let mut buffer = Vec::new();
    for i in 0..32u32 {
        encode_unsigned(&mut buffer, i * 1000).unwrap();
        encode_real(&mut buffer, i as f32 * 0.5).unwrap();
        encode_opening_tag(&mut buffer, 3).unwrap();
        encode_character_string(&mut buffer, "Zone temperature").unwrap();
        encode_object_identifier(&mut buffer, ObjectIdentifier::new(ObjectType::AnalogInput, i)).unwrap();
        encode_closing_tag(&mut buffer, 3).unwrap();
    }
    buffer
}

fn encode_benchmark(c: &mut Criterion) {
    c.bench_function("encode_mixed_payload", |b| b.iter(|| black_box(mixed_payload())));
}

fn decode_benchmark(c: &mut Criterion) {
    let payload = mixed_payload();

    c.bench_function("parse_next_walk", |b| {
        b.iter(|| {
            let mut parser = TagParser::new(black_box(&payload));
            let mut total = 0;
            while let Ok(consumed) = parser.parse_next() {
                if consumed == 0 {
                    break;
                }
                total += consumed;
            }
            total
        })
    });

    c.bench_function("walk_and_decode_values", |b| {
        b.iter(|| {
            let mut parser = TagParser::new(black_box(&payload));
            let mut values = 0;
            while parser.parse_next().unwrap_or(0) > 0 {
                if parser.to_application_value().is_ok() {
                    values += 1;
                }
            }
            values
        })
    });

    c.bench_function("validate_payload", |b| {
        let validator = TagValidator::default();
        b.iter(|| validator.validate(black_box(&payload)))
    });
}

fn header_benchmark(c: &mut Criterion) {
    c.bench_function("decode_pdu_header", |b| {
        b.iter(|| PduHeader::decode(black_box(&READ_PROPERTY_ACK)))
    });

    let schema = PropertySchema::standard();
    c.bench_function("read_property_ack_with_schema", |b| {
        b.iter(|| {
            let apdu = Apdu::parse(black_box(&READ_PROPERTY_ACK)).unwrap();
            let mut tags = apdu.tags();
            tags.next_tag().unwrap();
            let object = tags.to_object_identifier().unwrap();
            tags.next_tag().unwrap();
            let property = PropertyIdentifier::from(tags.to_enumerated().unwrap());
            tags.expect_opening(3).unwrap();
            schema.decode_value(object.object_type, property, None, &mut tags, 3)
        })
    });
}

criterion_group!(benches, encode_benchmark, decode_benchmark, header_benchmark);
criterion_main!(benches);
