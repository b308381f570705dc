//! Error types for session-level reply reads.

use thiserror::Error;

use crate::{codec::DecodeError, session::SessionId, status};

/// Failure of a session-level reply read.
///
/// A reply whose status code is nonzero is *not* represented here: it is an
/// ordinary successful decode carrying a server-side outcome.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session identifier is not in the table. Caller misuse; no session
    /// state exists to update.
    #[error("unknown session: {0}")]
    InvalidSession(SessionId),

    /// The reply could not be decoded. The session's last-error fields have
    /// been updated before this surfaces.
    #[error("failed to read reply: {0}")]
    Decode(#[from] DecodeError),
}

impl ClientError {
    /// Numeric code matching what the session recorded for this failure.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidSession(_) => status::PROTOCOL,
            Self::Decode(e) => e.code(),
        }
    }
}
