//! Client configuration.

use std::time::Duration;

use crate::codec::{DEFAULT_MAX_LIST_LEN, DEFAULT_MAX_TEXT_LEN};

/// Read window applied while a reply is in flight, unless the transport's
/// own timeout is already longer.
pub const DEFAULT_LONG_READ_TIMEOUT: Duration = Duration::from_secs(600);

/// Tunables for a reply-reading client.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use batchwire::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_long_read_timeout(Duration::from_secs(120))
///     .with_max_text_len(4096);
/// assert_eq!(config.long_read_timeout(), Duration::from_secs(120));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    long_read_timeout: Duration,
    max_text_len: usize,
    max_list_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            long_read_timeout: DEFAULT_LONG_READ_TIMEOUT,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            max_list_len: DEFAULT_MAX_LIST_LEN,
        }
    }
}

impl ClientConfig {
    /// Replace the long read window applied while a reply is in flight.
    #[must_use]
    pub fn with_long_read_timeout(mut self, timeout: Duration) -> Self {
        self.long_read_timeout = timeout;
        self
    }

    /// Replace the limit on one decoded text field.
    #[must_use]
    pub fn with_max_text_len(mut self, max: usize) -> Self {
        self.max_text_len = max;
        self
    }

    /// Replace the limit on one decoded list or array.
    #[must_use]
    pub fn with_max_list_len(mut self, max: usize) -> Self {
        self.max_list_len = max;
        self
    }

    /// Long read window applied while a reply is in flight.
    #[must_use]
    pub fn long_read_timeout(&self) -> Duration { self.long_read_timeout }

    /// Limit on one decoded text field.
    #[must_use]
    pub fn max_text_len(&self) -> usize { self.max_text_len }

    /// Limit on one decoded list or array.
    #[must_use]
    pub fn max_list_len(&self) -> usize { self.max_list_len }
}
