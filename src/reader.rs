//! Reading one reply from a transport under a raised timeout window.
//!
//! [`read_reply`] is session-independent: it prepares the transport, raises
//! the read timeout for the duration of the read, and decodes one reply. The
//! timeout is restored by [`TimeoutGuard`]'s drop, so restoration happens on
//! success, on decode failure, and on unwind alike.

use std::{
    io,
    ops::{Deref, DerefMut},
    time::Duration,
};

use log::warn;

use crate::{
    codec::{DecodeError, ReplyCodec},
    reply::Reply,
    transport::Transport,
};

/// Read and decode one reply.
///
/// Residual buffered state from a previous message is discarded before the
/// read, and again after a successful decode so the next message starts
/// clean. The transport's read timeout is raised to `long_timeout` for the
/// duration of the call iff its current timeout is shorter, and restored
/// unconditionally afterwards.
///
/// # Errors
///
/// Returns a [`DecodeError`] for any structural failure: truncation, a
/// malformed or unknown frame, timeout expiry, or transport I/O failure. No
/// partially decoded record survives an error.
pub fn read_reply<T, C>(
    transport: &mut T,
    codec: &C,
    long_timeout: Duration,
) -> Result<Reply, DecodeError>
where
    T: Transport,
    C: ReplyCodec + ?Sized,
{
    transport.reset_read_state();
    let mut guard = TimeoutGuard::raise(transport, long_timeout)?;
    let reply = codec.decode_reply(&mut *guard)?;
    guard.reset_read_state();
    tracing::trace!(
        code = reply.code(),
        variant = reply.body().variant_name(),
        "decoded reply"
    );
    Ok(reply)
}

/// Scoped raise of a transport's read timeout.
///
/// Raises on construction iff the active timeout is shorter than the
/// requested window (an unset timeout blocks indefinitely and is never
/// lowered). The saved value is restored when the guard drops, on every exit
/// path.
pub struct TimeoutGuard<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    saved: Option<Option<Duration>>,
}

impl<'a, T: Transport + ?Sized> TimeoutGuard<'a, T> {
    /// Raise the transport's read timeout to `window` if it is shorter.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot report or replace its
    /// timeout; nothing is changed in that case.
    pub fn raise(transport: &'a mut T, window: Duration) -> io::Result<Self> {
        let saved = match transport.read_timeout()? {
            Some(active) if active < window => {
                transport.set_read_timeout(Some(window))?;
                Some(Some(active))
            }
            _ => None,
        };
        Ok(Self { transport, saved })
    }
}

impl<T: Transport + ?Sized> Deref for TimeoutGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T { self.transport }
}

impl<T: Transport + ?Sized> DerefMut for TimeoutGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T { self.transport }
}

impl<T: Transport + ?Sized> Drop for TimeoutGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(previous) = self.saved.take() {
            if let Err(error) = self.transport.set_read_timeout(previous) {
                warn!("failed to restore read timeout: error={error}");
            }
        }
    }
}
