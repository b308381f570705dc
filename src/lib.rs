//! Client-side reply path for a batch-scheduling wire protocol.
//!
//! This crate reads one server reply at a time from a blocking transport,
//! decodes it from an untrusted length-prefixed wire encoding into an owned
//! [`Reply`] record, and tracks per-session last-error state (numeric code
//! plus diagnostic text) across calls. Releasing a record releases its entire
//! reachable structure exactly once; ownership makes double-release
//! unrepresentable.
//!
//! # Examples
//!
//! ```
//! use batchwire::{
//!     BinaryReplyCodec,
//!     ClientConfig,
//!     MemoryTransport,
//!     Reply,
//!     ReplyBody,
//!     SessionId,
//!     SessionTable,
//! };
//!
//! // A server-side refusal, as it would arrive off the wire.
//! let frame = BinaryReplyCodec::default()
//!     .encode_reply(&Reply::new(
//!         15_001,
//!         0,
//!         ReplyBody::Text(Some("Unauthorized Request".into())),
//!     ))
//!     .expect("encode");
//!
//! let table = SessionTable::new(ClientConfig::default());
//! let id = SessionId::new(1);
//! table.insert(id, MemoryTransport::with_frames([frame]));
//!
//! let reply = table.read_reply(id).expect("well-formed frame decodes");
//! assert_eq!(reply.code(), 15_001);
//! assert_eq!(table.error_text(id).as_deref(), Some("Unauthorized Request"));
//! ```

pub mod codec;
pub mod config;
pub mod reader;
pub mod reply;
pub mod session;
pub mod status;
pub mod transport;

pub use codec::{BinaryReplyCodec, DecodeError, Envelope, ReplyCodec, ReplyKind};
pub use config::ClientConfig;
pub use reader::{TimeoutGuard, read_reply};
pub use reply::{
    AttrList,
    Attribute,
    Chain,
    Reply,
    ReplyBody,
    ResourceQuery,
    SelectList,
    StatusEntry,
    StatusList,
};
pub use session::{ClientError, Session, SessionId, SessionTable};
pub use transport::{MemoryTransport, TcpTransport, Transport};
