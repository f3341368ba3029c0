use std::io::Cursor;

use super::header::{detect_byte_order, read_header, write_header, BinaryHeader};
use super::*;
use crate::feature::FeatureFlags;
use crate::format::{ByteOrder, SourceRef, SourceTable};

fn binary_header(vect_size: u16, flags: i32, rate: f32, order: ByteOrder) -> Vec<u8> {
    BinaryHeader {
        vect_size,
        flags,
        sample_rate: rate,
    }
    .encode(order)
    .to_vec()
}

fn frames(count: usize, vect_size: usize, order: ByteOrder) -> Vec<u8> {
    let values: Vec<f32> = (0..count * vect_size).map(|i| i as f32 * 0.5).collect();
    let mut bytes = vec![0u8; values.len() * 4];
    SPro4::encode_frames(&values, order, &mut bytes);
    bytes
}

fn parse(bytes: Vec<u8>, setting: ByteOrderSetting) -> Result<FormatDescriptor, FeatureError> {
    let mut file = FrameFile::new(Cursor::new(bytes))?;
    read_header(&mut file, setting, "stream")
}

#[test]
fn test_binary_header_exact_bytes() {
    let little = binary_header(13, 0x01, 100.0, ByteOrder::Little);
    let mut expected = vec![13, 0, 1, 0, 0, 0];
    expected.extend_from_slice(&100.0f32.to_le_bytes());
    assert_eq!(little, expected);

    let big = binary_header(13, 0x01, 100.0, ByteOrder::Big);
    let mut expected = vec![0, 13, 0, 0, 0, 1];
    expected.extend_from_slice(&100.0f32.to_be_bytes());
    assert_eq!(big, expected);
}

#[test]
fn test_parse_single_source_header() {
    let mut bytes = binary_header(2, 0x09, 100.0, ByteOrder::Little);
    bytes.extend(frames(3, 2, ByteOrder::Little));

    let descriptor = parse(bytes, ByteOrderSetting::Little).unwrap();
    assert_eq!(descriptor.vect_size, 2);
    assert_eq!(descriptor.flags, FeatureFlags::ENERGY | FeatureFlags::DELTA);
    assert_eq!(descriptor.sample_rate, 100.0);
    assert_eq!(descriptor.feature_count, 3);
    assert_eq!(descriptor.header_length, BINARY_HEADER_SIZE as u64);
    assert_eq!(descriptor.byte_order, ByteOrder::Little);
    assert_eq!(descriptor.sources, SourceTable::single("stream", 3));
}

#[test]
fn test_auto_detects_both_orders() {
    for order in [ByteOrder::Little, ByteOrder::Big] {
        let mut bytes = binary_header(2, 0, 100.0, order);
        bytes.extend(frames(3, 2, order));
        let descriptor = parse(bytes, ByteOrderSetting::Auto).unwrap();
        assert_eq!(descriptor.byte_order, order);
        assert_eq!(descriptor.vect_size, 2);
        assert_eq!(descriptor.feature_count, 3);
    }
}

#[test]
fn test_auto_keeps_native_when_ambiguous() {
    // 0x0101 reads the same both ways and an empty payload fits any width
    let raw = binary_header(0x0101, 0, 8000.0, ByteOrder::native());
    let raw: [u8; BINARY_HEADER_SIZE] = raw.try_into().unwrap();
    let (order, binary, _) = detect_byte_order(&raw, ByteOrderSetting::Auto, 0).unwrap();
    assert_eq!(order, ByteOrder::native());
    assert_eq!(binary.sample_rate, 8000.0);
}

#[test]
fn test_auto_falls_back_to_opposite_order() {
    let opposite = ByteOrder::native().opposite();
    let raw = binary_header(3, 0x01, 100.0, opposite);
    let raw: [u8; BINARY_HEADER_SIZE] = raw.try_into().unwrap();
    let (order, binary, flags) = detect_byte_order(&raw, ByteOrderSetting::Auto, 24).unwrap();
    assert_eq!(order, opposite);
    assert_eq!(binary.vect_size, 3);
    assert_eq!(flags, FeatureFlags::ENERGY);
}

#[test]
fn test_forced_wrong_order_is_rejected() {
    let mut bytes = binary_header(2, 0, 100.0, ByteOrder::Little);
    bytes.extend(frames(3, 2, ByteOrder::Little));
    assert!(matches!(
        parse(bytes, ByteOrderSetting::Big),
        Err(FeatureError::InvalidData(_))
    ));
}

#[test]
fn test_implausible_headers() {
    // truncated
    assert!(matches!(
        parse(vec![2, 0, 0, 0, 0], ByteOrderSetting::Auto),
        Err(FeatureError::InvalidData(_))
    ));

    // zero width
    let bytes = binary_header(0, 0, 100.0, ByteOrder::Little);
    assert!(matches!(
        parse(bytes, ByteOrderSetting::Little),
        Err(FeatureError::InvalidData(_))
    ));

    // partial trailing frame
    let mut bytes = binary_header(2, 0, 100.0, ByteOrder::Little);
    bytes.extend([0u8; 7]);
    assert!(matches!(
        parse(bytes, ByteOrderSetting::Auto),
        Err(FeatureError::InvalidData(_))
    ));

    // negative flags
    let bytes = binary_header(2, -1, 100.0, ByteOrder::Little);
    assert!(matches!(
        parse(bytes, ByteOrderSetting::Little),
        Err(FeatureError::InvalidData(_))
    ));

    // unknown flag bits
    let bytes = binary_header(2, 0x40, 100.0, ByteOrder::Little);
    assert!(matches!(
        parse(bytes, ByteOrderSetting::Little),
        Err(FeatureError::InvalidData(_))
    ));
}

#[test]
fn test_multi_source_text_header() {
    let descriptor = FormatDescriptor {
        vect_size: 2,
        flags: FeatureFlags::empty(),
        sample_rate: 100.0,
        feature_count: 8,
        header_length: 0,
        byte_order: ByteOrder::Big,
        sources: SourceTable::from_counts([("A", 3), ("B", 5)]).unwrap(),
    };

    let mut file = FrameFile::new(Cursor::new(Vec::new())).unwrap();
    let header_length = write_header(&mut file, &descriptor).unwrap();
    let mut bytes = file.into_inner().into_inner();

    let text = "<header>\nsource = 0 A\nsource = 3 B\n</header>\n";
    assert_eq!(&bytes[..text.len()], text.as_bytes());
    assert_eq!(header_length, (text.len() + BINARY_HEADER_SIZE) as u64);
    assert_eq!(bytes[text.len()..], binary_header(2, 0, 100.0, ByteOrder::Big)[..]);

    bytes.extend(frames(8, 2, ByteOrder::Big));
    let parsed = parse(bytes, ByteOrderSetting::Auto).unwrap();
    assert_eq!(parsed.header_length, header_length);
    assert_eq!(parsed.feature_count, 8);
    assert_eq!(parsed.byte_order, ByteOrder::Big);
    assert_eq!(parsed.sources, descriptor.sources);
}

#[test]
fn test_single_source_writes_no_text_block() {
    let descriptor = FormatDescriptor {
        vect_size: 4,
        flags: FeatureFlags::ENERGY,
        sample_rate: 50.0,
        feature_count: 0,
        header_length: 0,
        byte_order: ByteOrder::Little,
        sources: SourceTable::single("x", 0),
    };
    let mut file = FrameFile::new(Cursor::new(Vec::new())).unwrap();
    assert_eq!(write_header(&mut file, &descriptor).unwrap(), BINARY_HEADER_SIZE as u64);
    assert_eq!(
        file.into_inner().into_inner(),
        binary_header(4, 1, 50.0, ByteOrder::Little)
    );
}

#[test]
fn test_text_header_with_unrelated_keys_and_crlf() {
    let mut bytes =
        b"<header>\r\nnote = recorded on channel 2\r\nsource = 0 first take\r\nsource = 1 B\r\n</header>\r\n"
            .to_vec();
    let text_len = bytes.len();
    bytes.extend(binary_header(2, 0, 100.0, ByteOrder::Little));
    bytes.extend(frames(4, 2, ByteOrder::Little));

    let descriptor = parse(bytes, ByteOrderSetting::Little).unwrap();
    assert_eq!(descriptor.header_length, (text_len + BINARY_HEADER_SIZE) as u64);
    assert_eq!(descriptor.sources.name(0).unwrap(), "first take");
    assert_eq!(descriptor.sources.name(1).unwrap(), "B");
    assert_eq!(descriptor.sources.span(SourceRef::Name("B")).unwrap().count, 3);
}

#[test]
fn test_malformed_text_headers() {
    let unterminated = b"<header>\nsource = 0 A\n".to_vec();
    assert!(matches!(
        parse(unterminated, ByteOrderSetting::Auto),
        Err(FeatureError::InvalidData(_))
    ));

    let mut bad_start = b"<header>\nsource = x A\n</header>\n".to_vec();
    bad_start.extend(binary_header(2, 0, 100.0, ByteOrder::Little));
    assert!(matches!(
        parse(bad_start, ByteOrderSetting::Little),
        Err(FeatureError::InvalidData(_))
    ));

    // out of order, even though both late starts lie past the payload
    let mut unordered = b"<header>\nsource = 0 A\nsource = 9 B\nsource = 3 C\n</header>\n".to_vec();
    unordered.extend(binary_header(2, 0, 100.0, ByteOrder::Little));
    unordered.extend(frames(2, 2, ByteOrder::Little));
    assert!(matches!(
        parse(unordered, ByteOrderSetting::Little),
        Err(FeatureError::InvalidData(_))
    ));
}

#[test]
fn test_declared_starts_past_payload_read_as_empty() {
    let mut bytes = b"<header>\nsource = 0 A\nsource = 3 B\nsource = 9 C\n</header>\n".to_vec();
    bytes.extend(binary_header(2, 0, 100.0, ByteOrder::Little));
    bytes.extend(frames(2, 2, ByteOrder::Little));

    let descriptor = parse(bytes, ByteOrderSetting::Little).unwrap();
    assert_eq!(descriptor.feature_count, 2);
    assert_eq!(descriptor.sources.len(), 3);
    let a = descriptor.sources.span(SourceRef::Name("A")).unwrap();
    assert_eq!((a.first, a.count), (0, 2));
    for name in ["B", "C"] {
        let span = descriptor.sources.span(SourceRef::Name(name)).unwrap();
        assert_eq!((span.first, span.count), (2, 0));
    }

    // declarations survive for a later rewrite of the header
    let declared: Vec<_> = descriptor.sources.declared_starts().map(|(first, _)| first).collect();
    assert_eq!(declared, vec![0, 3, 9]);
}

#[test]
fn test_source_names_keep_inner_spacing() {
    let descriptor = FormatDescriptor {
        vect_size: 2,
        flags: FeatureFlags::empty(),
        sample_rate: 100.0,
        feature_count: 3,
        header_length: 0,
        byte_order: ByteOrder::Little,
        sources: SourceTable::from_counts([("spk  01", 1), ("spk\t02", 2)]).unwrap(),
    };
    let mut file = FrameFile::new(Cursor::new(Vec::new())).unwrap();
    write_header(&mut file, &descriptor).unwrap();
    let mut bytes = file.into_inner().into_inner();
    bytes.extend(frames(3, 2, ByteOrder::Little));

    let parsed = parse(bytes, ByteOrderSetting::Little).unwrap();
    assert_eq!(parsed.sources.name(0).unwrap(), "spk  01");
    assert_eq!(parsed.sources.name(1).unwrap(), "spk\t02");
    assert_eq!(parsed.sources.span(SourceRef::Name("spk  01")).unwrap().count, 1);
    assert_eq!(parsed.sources.span(SourceRef::Name("spk\t02")).unwrap().first, 1);
    assert!(parsed.sources.span(SourceRef::Name("spk 01")).is_err());
}
