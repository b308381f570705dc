//! Numeric status codes shared between decode errors and session state.
//!
//! Server-assigned codes pass through replies verbatim; the two codes defined
//! here are generated client-side and sit above the range servers use, so the
//! session's last-error field never conflates the two sources.

/// Successful reply status.
pub const OK: u32 = 0;

/// Structural protocol failure: the byte stream could not be decoded into a
/// reply record.
pub const PROTOCOL: u32 = 15_901;

/// Resource exhaustion while decoding or recording a diagnostic.
pub const SYSTEM: u32 = 15_902;
