//! Shared fixtures for reply-path integration tests.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use batchwire::{
    Attribute,
    BinaryReplyCodec,
    ClientConfig,
    MemoryTransport,
    Reply,
    ReplyBody,
    SessionId,
    SessionTable,
    StatusEntry,
    StatusList,
};
use bytes::Bytes;

/// Session id used by single-session fixtures.
pub const SID: SessionId = SessionId::new(1);

/// Encode a reply with the default codec.
pub fn encode(reply: &Reply) -> Bytes {
    BinaryReplyCodec::default()
        .encode_reply(reply)
        .expect("encode should succeed")
}

/// Table with one session scripted to serve `frames`.
pub fn single_session(frames: impl IntoIterator<Item = Bytes>) -> SessionTable<MemoryTransport> {
    let table = SessionTable::new(ClientConfig::default());
    table.insert(SID, MemoryTransport::with_frames(frames));
    table
}

/// Status reply of `entries` job entries, each carrying the same
/// name→value attribute pairs.
pub fn status_reply(entries: usize, pairs: &[(&str, &str)]) -> Reply {
    let list: StatusList = (0..entries)
        .map(|i| StatusEntry {
            kind: 1,
            name: format!("{i}.svr"),
            attributes: pairs
                .iter()
                .map(|(name, value)| Attribute {
                    name: Some((*name).into()),
                    resource: None,
                    value: Some((*value).into()),
                })
                .collect(),
        })
        .collect();
    Reply::new(0, 0, ReplyBody::Status(list))
}
