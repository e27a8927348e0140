use spanpack_common::error::ErrorKind;
use spanpack_payload::{
    Offset, PayloadDecoder, PayloadEncoder, PayloadRecord, PositionShape, ShapeTag, decode,
    encode, peek_header,
};

const START: u64 = 1000;

fn shapes(start: u64) -> Vec<PositionShape> {
    vec![
        PositionShape::None,
        PositionShape::Single(start),
        PositionShape::Range {
            start,
            end: start + 3,
        },
        PositionShape::Set(vec![start, start + 2, start + 9, start + 10]),
    ]
}

/// Every combination of shape and optional fields, with the real offset placed
/// both before and after the analyzed offset.
fn all_combinations(start: u64) -> Vec<PayloadRecord> {
    let mut records = Vec::new();
    for shape in shapes(start) {
        for mask in 0u32..32 {
            let mut record = PayloadRecord::new(17, shape.clone());
            if mask & 1 != 0 {
                record = record.with_offset(200, 210);
            }
            if mask & 2 != 0 {
                record = record.with_real_offset(190, 195);
            }
            if mask & 4 != 0 {
                record = record.with_parent(4);
            }
            if mask & 8 != 0 {
                record = record.with_payload(vec![0x00, 0xFF, 0x10]);
            }
            if mask & 16 != 0 {
                if record.real_offset.is_none() {
                    continue;
                }
                record = record.with_real_offset(230, 230);
            }
            records.push(record);
        }
    }
    records
}

fn random_record(rng: &mut fastrand::Rng, start: u64) -> PayloadRecord {
    let position = match rng.u8(0..4) {
        0 => PositionShape::None,
        1 => PositionShape::Single(start),
        2 => PositionShape::range(start, start + rng.u64(0..5000)),
        _ => {
            let mut points = vec![start];
            for _ in 0..rng.usize(1..20) {
                let last = *points.last().unwrap();
                points.push(last + rng.u64(1..300));
            }
            PositionShape::Set(points).canonical()
        }
    };
    let mut record = PayloadRecord::new(rng.u64(0..1_000_000), position);
    if rng.bool() {
        let start = rng.i64(0..100_000);
        record = record.with_offset(start, start + rng.i64(0..50));
    }
    if rng.bool() {
        // Only a delta from the analyzed offset can carry a negative start.
        let lowest = if record.offset.is_some() { -500 } else { 0 };
        let start = rng.i64(lowest..100_000);
        record = record.with_real_offset(start, start + rng.i64(0..50));
    }
    if rng.bool() {
        record = record.with_parent(rng.i64(-1000..1_000_000));
    }
    if rng.bool() {
        let len = rng.usize(1..40);
        record = record.with_payload((0..len).map(|_| rng.u8(..)).collect::<Vec<_>>());
    }
    record
}

/// Number of bytes taken by everything but the trailing payload.
fn fields_len(record: &PayloadRecord, start: u64) -> usize {
    let mut without_payload = record.clone();
    without_payload.payload = None;
    encode(&without_payload, start).unwrap().len()
}

#[test]
fn test_roundtrip_all_combinations() {
    for record in all_combinations(START) {
        let bytes = encode(&record, START).unwrap();
        let decoded = decode(START, &bytes).unwrap();
        assert_eq!(decoded, record, "bytes {bytes:02x?}");
    }
}

#[test]
fn test_roundtrip_random_records_with_reused_codec() {
    let mut rng = fastrand::Rng::with_seed(42);
    let mut encoder = PayloadEncoder::new();
    let mut decoder = PayloadDecoder::new();
    let mut bytes = Vec::new();
    for _ in 0..5000 {
        let start = rng.u64(0..1 << 40);
        let record = random_record(&mut rng, start);
        bytes.clear();
        encoder.encode_into(&record, start, &mut bytes).unwrap();
        assert_eq!(decoder.decode(start, &bytes).unwrap(), &record);
    }
}

#[test]
fn test_range_scenario() {
    let record = PayloadRecord::new(5, PositionShape::range(10, 12)).with_offset(100, 105);
    let bytes = encode(&record, 10).unwrap();

    let decoded = decode(10, &bytes).unwrap();
    assert_eq!(decoded.id, 5);
    assert_eq!(decoded.position, PositionShape::Range { start: 10, end: 12 });
    assert_eq!(decoded.offset, Some(Offset { start: 100, end: 105 }));
    assert_eq!(decoded.parent_id, None);
    assert_eq!(decoded.payload, None);
}

#[test]
fn test_single_with_parent_and_payload_scenario() {
    let record = PayloadRecord::new(0, PositionShape::Single(7))
        .with_parent(3)
        .with_payload(vec![0x41, 0x42]);
    let bytes = encode(&record, 7).unwrap();

    let decoded = decode(7, &bytes).unwrap();
    assert_eq!(decoded.id, 0);
    assert_eq!(decoded.position, PositionShape::Single(7));
    assert_eq!(decoded.parent_id, Some(3));
    assert_eq!(decoded.offset, None);
    assert_eq!(decoded.real_offset, None);
    assert_eq!(decoded.payload, Some(vec![0x41, 0x42]));
}

#[test]
fn test_same_bytes_decode_relative_to_start() {
    let record = PayloadRecord::new(1, PositionShape::Set(vec![50, 52, 60]));
    let bytes = encode(&record, 50).unwrap();
    let moved = decode(80, &bytes).unwrap();
    assert_eq!(moved.position, PositionShape::Set(vec![80, 82, 90]));
}

#[test]
fn test_non_canonical_positions_decode_canonical() {
    let record = PayloadRecord::new(3, PositionShape::Set(vec![8, 9, 10]));
    let decoded = decode(8, &encode(&record, 8).unwrap()).unwrap();
    assert_eq!(decoded, record.clone().canonical());
    assert_eq!(decoded.position, PositionShape::Range { start: 8, end: 10 });
}

#[test]
fn test_truncation_is_exhaustion() {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut records = all_combinations(START);
    records.extend((0..300).map(|_| random_record(&mut rng, START)));

    for record in records {
        let bytes = encode(&record, START).unwrap();
        let fields = fields_len(&record, START);
        // Cutting into the fields, or removing the whole payload, must fail.
        for cut in 0..=fields.min(bytes.len() - 1) {
            let err = decode(START, &bytes[..cut]).unwrap_err();
            assert!(
                err.is_stream_exhausted(),
                "record {record:?} cut at {cut}: {err}"
            );
        }
    }
}

#[test]
fn test_payload_consumes_remaining_bytes() {
    let mut rng = fastrand::Rng::with_seed(11);
    for _ in 0..500 {
        let record = random_record(&mut rng, START).with_payload(vec![0xAB; rng.usize(1..64)]);
        let bytes = encode(&record, START).unwrap();
        let fields = fields_len(&record, START);
        let decoded = decode(START, &bytes).unwrap();
        let payload = decoded.payload.unwrap();
        assert_eq!(payload.len(), bytes.len() - fields);
        assert_eq!(&bytes[fields..], payload.as_slice());
    }
}

#[test]
fn test_arbitrary_bytes_decode_or_exhaust_and_sets_ascend() {
    let mut rng = fastrand::Rng::with_seed(0xdecade);
    let mut decoder = PayloadDecoder::new();
    let mut set_count = 0;
    for _ in 0..20_000 {
        let len = rng.usize(0..24);
        let bytes: Vec<u8> = (0..len).map(|_| rng.u8(..)).collect();
        match decoder.decode(rng.u64(0..1 << 32), &bytes) {
            Ok(record) => {
                if let PositionShape::Set(points) = &record.position {
                    set_count += 1;
                    assert!(points.windows(2).all(|pair| pair[0] < pair[1]));
                }
            }
            Err(e) => assert!(
                matches!(e.kind(), ErrorKind::StreamExhausted { .. }),
                "bytes {bytes:02x?}: {e}"
            ),
        }
    }
    assert!(set_count > 0);
}

#[test]
fn test_peek_header_matches_record() {
    let record = PayloadRecord::new(9, PositionShape::Set(vec![3, 5]))
        .with_parent(1)
        .with_payload(vec![1]);
    let header = peek_header(&encode(&record, 3).unwrap()).unwrap();
    assert_eq!(header.shape, ShapeTag::Set);
    assert!(header.has_parent());
    assert!(header.has_payload());
    assert!(!header.has_offset());
    assert!(!header.has_real_offset());
}
