//! Unit tests for the binary reply codec.
//!
//! Covers envelope and payload decoding for every variant, rejection of
//! malformed frames before allocation, and a truncation sweep asserting that
//! no strict prefix of a valid frame decodes.

use std::io::{self, Cursor};

use proptest::prelude::*;
use rstest::rstest;

use super::*;
use crate::status;

fn decode(codec: &BinaryReplyCodec, bytes: &[u8]) -> Result<Reply, DecodeError> {
    codec.decode_reply(&mut Cursor::new(bytes))
}

fn frame(codec: &BinaryReplyCodec, reply: &Reply) -> Bytes {
    codec.encode_reply(reply).expect("encode should succeed")
}

#[test]
fn text_frame_layout_is_stable() {
    let codec = BinaryReplyCodec::default();
    let reply = Reply::new(7, 0, ReplyBody::Text(Some("ok".into())));
    let expected = [
        0, 0, 0, 7, // status code
        0, 0, 0, 0, // aux code
        1, // text discriminant
        1, // message present
        0, 0, 0, 2, b'o', b'k',
    ];
    assert_eq!(frame(&codec, &reply).as_ref(), expected);
}

#[test]
fn decodes_text_reply_with_absent_message() {
    let codec = BinaryReplyCodec::default();
    let reply = Reply::new(0, 0, ReplyBody::Text(None));
    let decoded = decode(&codec, &frame(&codec, &reply)).expect("decode should succeed");
    assert_eq!(decoded, reply);
}

#[test]
fn decodes_select_reply_in_order() {
    let codec = BinaryReplyCodec::default();
    let jobs: SelectList = ["17.svr", "18.svr"].map(String::from).into_iter().collect();
    let bytes = frame(&codec, &Reply::new(0, 0, ReplyBody::Select(jobs)));

    let decoded = decode(&codec, &bytes).expect("decode should succeed");
    let ReplyBody::Select(jobs) = decoded.body() else {
        panic!("expected a select payload, got {:?}", decoded.body());
    };
    assert_eq!(jobs.iter().collect::<Vec<_>>(), ["17.svr", "18.svr"]);
}

#[test]
fn decodes_status_reply_with_nested_attributes() {
    let codec = BinaryReplyCodec::default();
    let attributes: AttrList = [Attribute {
        name: Some("state".into()),
        resource: None,
        value: Some("R".into()),
    }]
    .into_iter()
    .collect();
    let entries: StatusList = [StatusEntry {
        kind: 2,
        name: "17.svr".into(),
        attributes,
    }]
    .into_iter()
    .collect();
    let bytes = frame(&codec, &Reply::new(0, 0, ReplyBody::Status(entries)));

    let decoded = decode(&codec, &bytes).expect("decode should succeed");
    let ReplyBody::Status(entries) = decoded.body() else {
        panic!("expected a status payload, got {:?}", decoded.body());
    };
    let entry = entries.iter().next().expect("one entry expected");
    assert_eq!(entry.kind, 2);
    assert_eq!(entry.name, "17.svr");
    let attribute = entry.attributes.iter().next().expect("one attribute expected");
    assert_eq!(attribute.name.as_deref(), Some("state"));
    assert_eq!(attribute.resource, None);
    assert_eq!(attribute.value.as_deref(), Some("R"));
}

#[test]
fn decodes_resource_query_with_absent_arrays() {
    let codec = BinaryReplyCodec::default();
    let query = ResourceQuery {
        available: Some(vec![1, 2]),
        allocated: None,
        reserved: Some(vec![]),
        down: None,
    };
    let bytes = frame(&codec, &Reply::new(0, 0, ReplyBody::ResourceQuery(query)));

    let decoded = decode(&codec, &bytes).expect("decode should succeed");
    let ReplyBody::ResourceQuery(query) = decoded.body() else {
        panic!("expected a resource query payload, got {:?}", decoded.body());
    };
    assert_eq!(query.available.as_deref(), Some(&[1, 2][..]));
    assert_eq!(query.allocated, None);
    assert_eq!(query.reserved.as_deref(), Some(&[][..]));
    assert_eq!(query.down, None);
}

#[test]
fn empty_stream_is_truncated() {
    let codec = BinaryReplyCodec::default();
    let err = decode(&codec, &[]).expect_err("empty stream must not decode");
    assert!(matches!(err, DecodeError::Truncated { .. }), "got {err:?}");
    assert_eq!(err.code(), status::PROTOCOL);
}

#[test]
fn unknown_discriminant_is_rejected() {
    let codec = BinaryReplyCodec::default();
    let mut bytes = vec![0u8; 8];
    bytes.push(0x2a);
    let err = decode(&codec, &bytes).expect_err("unknown tag must not decode");
    assert!(
        matches!(err, DecodeError::UnknownDiscriminant { tag: 0x2a }),
        "got {err:?}"
    );
}

#[rstest]
#[case::text_length(TAG_TEXT, vec![1, 0xff, 0xff, 0xff, 0xff])]
#[case::select_count(TAG_SELECT, vec![0xff, 0xff, 0xff, 0xff])]
#[case::status_count(TAG_STATUS, vec![0xff, 0xff, 0xff, 0xff])]
#[case::resource_count(TAG_RESOURCE_QUERY, vec![1, 0xff, 0xff, 0xff, 0xff])]
fn oversized_lengths_are_rejected_before_allocation(#[case] tag: u8, #[case] payload: Vec<u8>) {
    // Limits far below the claimed sizes: the claim must be rejected without
    // reserving anything.
    let codec = BinaryReplyCodec::new(16, 16);
    let mut bytes = vec![0u8; 8];
    bytes.push(tag);
    bytes.extend_from_slice(&payload);
    let err = decode(&codec, &bytes).expect_err("oversized claim must not decode");
    assert!(
        matches!(err, DecodeError::OversizedLength { max: 16, .. }),
        "got {err:?}"
    );
}

#[test]
fn invalid_presence_flag_is_rejected() {
    let codec = BinaryReplyCodec::default();
    let mut bytes = vec![0u8; 8];
    bytes.extend_from_slice(&[TAG_TEXT, 9]);
    let err = decode(&codec, &bytes).expect_err("bad flag must not decode");
    assert!(matches!(err, DecodeError::InvalidFlag { flag: 9 }), "got {err:?}");
}

#[test]
fn invalid_utf8_text_is_rejected() {
    let codec = BinaryReplyCodec::default();
    let mut bytes = vec![0u8; 8];
    bytes.extend_from_slice(&[TAG_TEXT, 1, 0, 0, 0, 2, 0xc3, 0x28]);
    let err = decode(&codec, &bytes).expect_err("invalid UTF-8 must not decode");
    assert!(matches!(err, DecodeError::InvalidText), "got {err:?}");
}

#[test]
fn error_codes_distinguish_exhaustion_from_protocol_failures() {
    assert_eq!(DecodeError::ResourceExhaustion.code(), status::SYSTEM);
    assert_eq!(DecodeError::InvalidText.code(), status::PROTOCOL);
    assert_eq!(
        DecodeError::Io(io::Error::from(io::ErrorKind::TimedOut)).code(),
        status::PROTOCOL
    );
}

#[test]
fn timeout_expiry_is_classified_as_timeout() {
    let err = DecodeError::Io(io::Error::from(io::ErrorKind::TimedOut));
    assert!(err.is_timeout());
    assert!(!DecodeError::InvalidText.is_timeout());
}

fn attribute_strategy() -> impl Strategy<Value = Attribute> {
    let field = proptest::option::of("[a-z]{0,8}");
    (field.clone(), field.clone(), field).prop_map(|(name, resource, value)| Attribute {
        name,
        resource,
        value,
    })
}

fn body_strategy() -> impl Strategy<Value = ReplyBody> {
    let counts = proptest::option::of(prop::collection::vec(any::<u64>(), 0..4));
    prop_oneof![
        Just(ReplyBody::Empty),
        proptest::option::of("[ -~]{0,16}").prop_map(ReplyBody::Text),
        prop::collection::vec("[a-z0-9.]{1,10}", 0..4)
            .prop_map(|jobs| ReplyBody::Select(jobs.into_iter().collect())),
        prop::collection::vec(
            (any::<u8>(), "[a-z0-9.]{1,10}", prop::collection::vec(attribute_strategy(), 0..3)),
            0..3
        )
        .prop_map(|entries| {
            ReplyBody::Status(
                entries
                    .into_iter()
                    .map(|(kind, name, attributes)| StatusEntry {
                        kind,
                        name,
                        attributes: attributes.into_iter().collect(),
                    })
                    .collect(),
            )
        }),
        (counts.clone(), counts.clone(), counts.clone(), counts).prop_map(
            |(available, allocated, reserved, down)| {
                ReplyBody::ResourceQuery(ResourceQuery {
                    available,
                    allocated,
                    reserved,
                    down,
                })
            }
        ),
    ]
}

proptest! {
    /// Every strict prefix of a valid frame fails to decode; none panics or
    /// yields a record.
    #[test]
    fn truncated_frames_never_decode(
        code in any::<u32>(),
        aux in any::<u32>(),
        body in body_strategy(),
    ) {
        let codec = BinaryReplyCodec::default();
        let bytes = frame(&codec, &Reply::new(code, aux, body));
        for cut in 0..bytes.len() {
            let result = decode(&codec, &bytes[..cut]);
            prop_assert!(result.is_err(), "prefix of {cut} bytes decoded");
        }
    }

    /// Well-formed frames of every shape decode back to the value encoded.
    #[test]
    fn well_formed_frames_decode(
        code in any::<u32>(),
        aux in any::<u32>(),
        body in body_strategy(),
    ) {
        let codec = BinaryReplyCodec::default();
        let reply = Reply::new(code, aux, body);
        let decoded = decode(&codec, &frame(&codec, &reply));
        prop_assert!(decoded.is_ok());
        prop_assert_eq!(decoded.unwrap(), reply);
    }
}
