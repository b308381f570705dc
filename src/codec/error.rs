//! Error taxonomy for the reply wire codec.
//!
//! Every failure to turn a byte stream into a [`Reply`](crate::Reply) is a
//! [`DecodeError`]. Timeout expiry arrives as an [`Io`](DecodeError::Io) error
//! from the transport and is a structural failure like any other: the
//! connection's framing state is indeterminate afterwards and must be reset
//! before reuse. A nonzero server status inside a well-formed reply is *not*
//! an error and never appears here.

use std::io;

use thiserror::Error;

use crate::status;

/// Failure to decode one reply from the wire.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The stream ended before the frame was complete.
    #[error("truncated reply: stream ended {needed} bytes short")]
    Truncated {
        /// Bytes still required when the stream ended.
        needed: usize,
    },

    /// The envelope named a reply variant this codec does not know.
    #[error("unknown reply discriminant: {tag:#04x}")]
    UnknownDiscriminant {
        /// Discriminant byte read from the wire.
        tag: u8,
    },

    /// A length or count field exceeds the codec's configured limit.
    ///
    /// Rejected before any allocation takes place.
    #[error("field length {len} exceeds limit {max}")]
    OversizedLength {
        /// Length claimed by the frame.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// An optional-field presence flag was neither absent nor present.
    #[error("invalid presence flag: {flag:#04x}")]
    InvalidFlag {
        /// Flag byte read from the wire.
        flag: u8,
    },

    /// A text field was not valid UTF-8.
    #[error("reply text is not valid UTF-8")]
    InvalidText,

    /// Memory for a decoded payload could not be reserved.
    #[error("out of memory while decoding reply")]
    ResourceExhaustion,

    /// Transport-level read failure, including timeout expiry.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// Stable numeric code recorded as the session's last error.
    ///
    /// Resource exhaustion maps to [`status::SYSTEM`]; every structural
    /// failure maps to [`status::PROTOCOL`].
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::ResourceExhaustion => status::SYSTEM,
            _ => status::PROTOCOL,
        }
    }

    /// Returns `true` when the failure was the read window elapsing.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
        )
    }
}
