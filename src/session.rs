//! Per-connection session table and the session-level reply read.
//!
//! A [`SessionTable`] maps [`SessionId`]s to live [`Session`]s, each owning
//! its transport plus the last status code observed and an owned diagnostic
//! text. [`read_reply`](SessionTable::read_reply) performs one
//! read-and-decode cycle and updates that error state on both outcomes, so a
//! session's diagnostics stay consistent across many cycles.
//!
//! Each session sits behind its own lock, independent of the map's shard
//! locks: the map is touched only long enough to clone the entry handle, so a
//! blocking read on one session never stalls access to any other. The
//! transport's framing and timeout state are still not reentrant — callers
//! must keep at most one `read_reply` in flight per session (a second
//! concurrent call on the same id blocks on the session's lock until the
//! first completes).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use crate::{
    codec::{BinaryReplyCodec, ReplyCodec},
    config::ClientConfig,
    reader,
    reply::{Reply, ReplyBody},
    status,
    transport::Transport,
};

mod error;

pub use error::ClientError;

/// Identifier assigned to a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl From<u64> for SessionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl SessionId {
    /// Create a new [`SessionId`] with the provided value.
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

/// One live connection: its transport and last-error bookkeeping.
#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    last_error: u32,
    error_text: Option<String>,
}

impl<T> Session<T> {
    /// Wrap a transport in a fresh session with no error recorded.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            last_error: status::OK,
            error_text: None,
        }
    }

    /// Last status code observed on this session.
    #[must_use]
    pub fn last_error(&self) -> u32 { self.last_error }

    /// Current diagnostic text, if any error text has been recorded.
    #[must_use]
    pub fn error_text(&self) -> Option<&str> { self.error_text.as_deref() }

    /// Recover the transport, dropping the session bookkeeping.
    #[must_use]
    pub fn into_transport(self) -> T { self.transport }
}

/// Table of live sessions sharing one codec and configuration.
pub struct SessionTable<T, C = BinaryReplyCodec> {
    sessions: DashMap<SessionId, Arc<Mutex<Session<T>>>>,
    codec: C,
    config: ClientConfig,
}

impl<T: Transport> SessionTable<T> {
    /// Table using the default binary codec, with limits from `config`.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let codec = BinaryReplyCodec::new(config.max_text_len(), config.max_list_len());
        Self::with_codec(config, codec)
    }
}

impl<T: Transport, C: ReplyCodec> SessionTable<T, C> {
    /// Table using a caller-supplied codec.
    #[must_use]
    pub fn with_codec(config: ClientConfig, codec: C) -> Self {
        Self {
            sessions: DashMap::new(),
            codec,
            config,
        }
    }

    /// Register a transport under `id`, replacing any prior session.
    pub fn insert(&self, id: SessionId, transport: T) {
        self.sessions
            .insert(id, Arc::new(Mutex::new(Session::new(transport))));
    }

    /// Remove the session, returning it to the caller for teardown.
    ///
    /// Returns `None` when `id` is unknown, or when a read is still in
    /// flight on the session (the in-flight call keeps the entry alive; the
    /// id is forgotten either way).
    pub fn remove(&self, id: SessionId) -> Option<Session<T>> {
        let (_, entry) = self.sessions.remove(&id)?;
        Arc::into_inner(entry)
            .map(|mutex| mutex.into_inner().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize { self.sessions.len() }

    /// Returns `true` when no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }

    /// Last status code observed on the session, or `None` if unknown.
    #[must_use]
    pub fn last_error(&self, id: SessionId) -> Option<u32> {
        let entry = self.entry(id).ok()?;
        let session = lock(&entry);
        Some(session.last_error)
    }

    /// Copy of the session's diagnostic text; `None` when the session is
    /// unknown or has no error text recorded.
    #[must_use]
    pub fn error_text(&self, id: SessionId) -> Option<String> {
        let entry = self.entry(id).ok()?;
        let session = lock(&entry);
        session.error_text.clone()
    }

    /// Overwrite the session's error state. The prior diagnostic text is
    /// dropped on replacement.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidSession`] if `id` is unknown.
    pub fn set_error(
        &self,
        id: SessionId,
        code: u32,
        text: Option<String>,
    ) -> Result<(), ClientError> {
        let entry = self.entry(id)?;
        let mut session = lock(&entry);
        session.last_error = code;
        session.error_text = text;
        Ok(())
    }

    /// Read and decode one reply on the session.
    ///
    /// The prior diagnostic text is cleared before the read starts, so stale
    /// diagnostics are never visible once a new attempt begins. On decode
    /// failure the session records the failure's code and message; on success
    /// it records the reply's own status code, plus a copy of the message
    /// when the reply carries text. The returned record is owned by the
    /// caller; the session keeps only its independent diagnostic copy.
    ///
    /// A nonzero reply status is a successful read: the server's status
    /// becomes the session's last error and the record is returned for the
    /// caller to inspect.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidSession`] if `id` is unknown;
    /// [`ClientError::Decode`] if no reply could be decoded, with the
    /// session's last-error fields updated first.
    pub fn read_reply(&self, id: SessionId) -> Result<Reply, ClientError> {
        let entry = self.entry(id)?;
        let mut session = lock(&entry);
        session.error_text = None;

        let long_timeout = self.config.long_read_timeout();
        match reader::read_reply(&mut session.transport, &self.codec, long_timeout) {
            Err(e) => {
                session.last_error = e.code();
                session.error_text = Some(e.to_string());
                tracing::debug!(session = %id, code = e.code(), error = %e, "reply read failed");
                Err(ClientError::Decode(e))
            }
            Ok(reply) => {
                session.last_error = reply.code();
                if let ReplyBody::Text(Some(text)) = reply.body() {
                    if !text.is_empty() {
                        session.error_text = Some(text.clone());
                    }
                }
                Ok(reply)
            }
        }
    }

    /// Clone the session's handle, holding the map lock only for the lookup.
    fn entry(&self, id: SessionId) -> Result<Arc<Mutex<Session<T>>>, ClientError> {
        self.sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ClientError::InvalidSession(id))
    }
}

fn lock<T>(session: &Mutex<Session<T>>) -> MutexGuard<'_, Session<T>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}
