//! Session Configuration
//!
//! Settings for a [`Session`](crate::Session): the application id sent in
//! the handshake plus connect and I/O limits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PresenceError, Result};

/// Default per-candidate connect timeout in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Default size of the single-read receive buffer
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Session configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Application id announced in the handshake. Must not be empty.
    pub client_id: String,

    /// Connection timeout in milliseconds
    ///
    /// Applied to each endpoint candidate separately.
    pub connect_timeout_ms: u64,

    /// Read/write deadline in milliseconds (0 = no deadline)
    ///
    /// Without a deadline, reads and writes block until the peer acts.
    pub io_timeout_ms: u64,

    /// Receive buffer size in bytes
    ///
    /// Each frame from the peer must arrive in a single read of at most this
    /// many bytes.
    pub read_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            io_timeout_ms: 0,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl SessionConfig {
    /// Configuration for application `client_id` with default limits
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `PRESENCE_CLIENT_ID`: Application id
    /// - `PRESENCE_CONNECT_TIMEOUT`: Connection timeout in ms
    /// - `PRESENCE_IO_TIMEOUT`: Read/write deadline in ms (0 = none)
    /// - `PRESENCE_READ_BUFFER`: Receive buffer size in bytes
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            client_id: lookup("PRESENCE_CLIENT_ID").unwrap_or_default(),
            connect_timeout_ms: lookup("PRESENCE_CONNECT_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.connect_timeout_ms),
            io_timeout_ms: lookup("PRESENCE_IO_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.io_timeout_ms),
            read_buffer_size: lookup("PRESENCE_READ_BUFFER")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.read_buffer_size),
        }
    }

    /// Check the configuration can drive a session
    ///
    /// # Errors
    ///
    /// Returns `PresenceError::InvalidConfig` for an empty client id, a zero
    /// connect timeout, or a receive buffer too small to hold a frame.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(PresenceError::InvalidConfig(
                "client id must not be empty".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(PresenceError::InvalidConfig(
                "connect timeout must be positive".to_string(),
            ));
        }
        if self.read_buffer_size <= crate::transport::frame::HEADER_SIZE {
            return Err(PresenceError::InvalidConfig(format!(
                "read buffer of {} bytes cannot hold a frame",
                self.read_buffer_size
            )));
        }
        Ok(())
    }

    /// Connect timeout as a `Duration`
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// I/O deadline, `None` when disabled
    #[must_use]
    pub fn io_timeout(&self) -> Option<Duration> {
        (self.io_timeout_ms > 0).then(|| Duration::from_millis(self.io_timeout_ms))
    }
}
