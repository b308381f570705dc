//! Blocking transport seam for reply reads.
//!
//! [`Transport`] is the byte-stream contract the reply reader needs: a
//! blocking [`Read`] primitive, a read timeout that can be saved and
//! restored, and [`reset_read_state`](Transport::reset_read_state) to discard
//! residual buffered bytes after a structural failure so the next read starts
//! at a fresh frame boundary.
//!
//! Transport state is not reentrant: at most one read may be in flight per
//! transport at a time.

use std::{
    collections::VecDeque,
    io::{self, Read},
    net::TcpStream,
    time::Duration,
};

use bytes::{Buf, Bytes, BytesMut};

/// Byte-stream handle used to read replies.
pub trait Transport: Read {
    /// Current read timeout; `None` blocks indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying handle cannot report its timeout.
    fn read_timeout(&self) -> io::Result<Option<Duration>>;

    /// Replace the read timeout; `None` blocks indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying handle rejects the timeout.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Discard residual buffered bytes from a previous message.
    fn reset_read_state(&mut self);
}

/// TCP transport with a replay buffer ahead of the socket.
///
/// Bytes handed back via [`rewind`](Self::rewind) (for example, read past a
/// frame boundary during connection setup) are served before the socket is
/// touched again. [`reset_read_state`](Transport::reset_read_state) drops
/// them.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    rewound: BytesMut,
}

impl TcpTransport {
    /// Wrap a connected stream.
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            rewound: BytesMut::new(),
        }
    }

    /// Queue bytes to be served ahead of the socket.
    pub fn rewind(&mut self, leftover: &[u8]) { self.rewound.extend_from_slice(leftover); }

    /// Borrow the underlying stream.
    #[must_use]
    pub fn get_ref(&self) -> &TcpStream { &self.stream }

    /// Recover the underlying stream, dropping any buffered bytes.
    #[must_use]
    pub fn into_inner(self) -> TcpStream { self.stream }
}

impl Read for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.rewound.is_empty() {
            let n = self.rewound.len().min(buf.len());
            self.rewound.copy_to_slice(&mut buf[..n]);
            return Ok(n);
        }
        self.stream.read(buf)
    }
}

impl Transport for TcpTransport {
    fn read_timeout(&self) -> io::Result<Option<Duration>> { self.stream.read_timeout() }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    fn reset_read_state(&mut self) { self.rewound.clear(); }
}

/// Scripted in-memory transport.
///
/// Serves a queue of frames as one contiguous stream and reports end of
/// stream once the script is exhausted. Useful for tests and harnesses that
/// need deterministic transport behaviour without a socket.
///
/// [`reset_read_state`](Transport::reset_read_state) discards whatever
/// remains of the frame currently being served, modelling a framing reset
/// after a structural failure: the next read starts at the next scripted
/// frame.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    frames: VecDeque<Bytes>,
    current: Bytes,
    timeout: Option<Duration>,
    resets: usize,
}

impl MemoryTransport {
    /// Empty transport: reads report end of stream immediately.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Transport pre-loaded with a script of frames.
    #[must_use]
    pub fn with_frames(frames: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Append one frame to the script.
    pub fn push_frame(&mut self, frame: impl Into<Bytes>) {
        self.frames.push_back(frame.into());
    }

    /// Number of times the read state has been reset.
    #[must_use]
    pub fn resets(&self) -> usize { self.resets }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.current.is_empty() {
            match self.frames.pop_front() {
                Some(frame) => self.current = frame,
                None => return Ok(0),
            }
        }
        let n = self.current.len().min(buf.len());
        self.current.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

impl Transport for MemoryTransport {
    fn read_timeout(&self) -> io::Result<Option<Duration>> { Ok(self.timeout) }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn reset_read_state(&mut self) {
        self.current = Bytes::new();
        self.resets += 1;
    }
}
