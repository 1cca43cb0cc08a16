//! Property-based tests for frame and handshake parsing.

use proptest::prelude::*;
use wsmux::Error;
use wsmux::protocol::{Frame, HandshakeRequest, OpCode, apply_mask, apply_mask_fast};

fn opcode_strategy() -> impl Strategy<Value = OpCode> {
    prop_oneof![
        Just(OpCode::Text),
        Just(OpCode::Binary),
        Just(OpCode::Close),
        Just(OpCode::Ping),
        Just(OpCode::Pong),
    ]
}

/// Lengths straddling every length-encoding boundary.
fn length_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        Just(0usize),
        Just(1),
        Just(125),
        Just(126),
        Just(65535),
        Just(65536),
        Just(70000),
        0usize..300,
    ]
}

fn encode(frame: &Frame, mask: Option<[u8; 4]>) -> Vec<u8> {
    let mut buf = Vec::new();
    frame.write(&mut buf, mask).unwrap();
    buf
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_roundtrip_preserves_frame(
        fin in any::<bool>(),
        opcode in opcode_strategy(),
        len in length_strategy(),
        byte in any::<u8>(),
        mask in proptest::option::of(any::<[u8; 4]>()),
    ) {
        let mut frame = Frame::new(fin, opcode, vec![byte; len]);
        if let Some(key) = mask {
            frame = frame.with_mask(key);
        }

        let wire = encode(&frame, mask);
        prop_assert_eq!(wire.len(), frame.wire_size(mask.is_some()));

        let (parsed, consumed) = Frame::parse(&wire).unwrap();
        prop_assert_eq!(consumed, wire.len());
        prop_assert_eq!(parsed, frame);
    }

    #[test]
    fn test_length_encoding_is_minimal(len in length_strategy()) {
        let wire = encode(&Frame::binary(vec![0u8; len]), None);
        let marker = wire[1] & 0x7F;
        match len {
            0..=125 => prop_assert_eq!(usize::from(marker), len),
            126..=65535 => prop_assert_eq!(marker, 126),
            _ => prop_assert_eq!(marker, 127),
        }
    }

    #[test]
    fn test_mask_is_self_inverse(
        data in prop::collection::vec(any::<u8>(), 0..2000),
        mask in any::<[u8; 4]>()
    ) {
        let mut masked = data.clone();
        apply_mask(&mut masked, mask);
        apply_mask(&mut masked, mask);
        prop_assert_eq!(&data, &masked);
    }

    #[test]
    fn test_fast_mask_matches_scalar(
        data in prop::collection::vec(any::<u8>(), 0..2000),
        mask in any::<[u8; 4]>()
    ) {
        let mut scalar = data.clone();
        let mut fast = data;
        apply_mask(&mut scalar, mask);
        apply_mask_fast(&mut fast, mask);
        prop_assert_eq!(scalar, fast);
    }

    #[test]
    fn test_truncated_frame_is_incomplete(
        opcode in opcode_strategy(),
        payload in prop::collection::vec(any::<u8>(), 1..500),
        cut in 1usize..50,
    ) {
        let wire = encode(&Frame::new(true, opcode, payload), None);
        let keep = wire.len().saturating_sub(cut).max(1);
        let result = Frame::parse(&wire[..keep]);
        let is_incomplete = matches!(result, Err(Error::IncompleteFrame { .. }));
        prop_assert!(is_incomplete);
    }

    #[test]
    fn test_sequential_frames(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..200), 1..5)
    ) {
        let frames: Vec<Frame> = payloads.into_iter().map(Frame::binary).collect();
        let mut wire = Vec::new();
        for frame in &frames {
            frame.write(&mut wire, None).unwrap();
        }

        let mut offset = 0;
        for original in &frames {
            let (parsed, consumed) = Frame::parse(&wire[offset..]).unwrap();
            prop_assert_eq!(&parsed, original);
            offset += consumed;
        }
        prop_assert_eq!(offset, wire.len());
    }

    #[test]
    fn test_arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = Frame::parse(&data);
    }

    #[test]
    fn test_reserved_bits_always_rejected(
        rsv in 1u8..8,
        payload in prop::collection::vec(any::<u8>(), 0..100),
    ) {
        let mut wire = encode(&Frame::text(payload), None);
        wire[0] |= rsv << 4;
        prop_assert_eq!(Frame::parse(&wire), Err(Error::ReservedBitsSet));
    }

    #[test]
    fn test_handshake_parse_no_panic(data in prop::collection::vec(any::<u8>(), 0..2000)) {
        let _ = HandshakeRequest::parse(&data);
    }

    #[test]
    fn test_handshake_valid_variations(
        path in "/[a-z]{1,20}",
        host in "[a-z]{3,10}\\.[a-z]{2,4}",
        key in "[A-Za-z0-9+/]{22}==",
    ) {
        let request = format!(
            "GET {path} HTTP/1.1\r\n\
             Host: {host}\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: {key}\r\n\
             Sec-WebSocket-Version: 13\r\n\r\n"
        );

        let parsed = HandshakeRequest::parse(request.as_bytes()).unwrap();
        prop_assert_eq!(parsed.key(), key.as_str());
    }
}

mod boundaries {
    use super::*;

    #[test]
    fn test_extended_length_headers() {
        for (len, header_len) in [(125, 2), (126, 4), (65535, 4), (65536, 10)] {
            let frame = Frame::binary(vec![0xAB; len]);
            let wire = encode(&frame, None);
            assert_eq!(wire.len(), header_len + len, "len {len}");
            let (parsed, _) = Frame::parse(&wire).unwrap();
            assert_eq!(parsed.payload().len(), len);
        }
    }

    #[test]
    fn test_extreme_masks() {
        for mask in [[0, 0, 0, 0], [0xFF, 0xFF, 0xFF, 0xFF]] {
            let frame = Frame::text("test payload").with_mask(mask);
            let (parsed, _) = Frame::parse(&encode(&frame, Some(mask))).unwrap();
            assert_eq!(parsed.payload(), b"test payload");
        }
    }
}
