//! Error types for the presence client.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by endpoint discovery, framing and session operations
#[derive(Debug, Error)]
pub enum PresenceError {
    /// Every endpoint candidate was absent
    ///
    /// The desktop application is most likely not running. Callers may retry later.
    #[error("Peer is not running: no IPC endpoint found")]
    PeerNotRunning,

    /// An endpoint exists but connecting to it failed (refused, permission denied, timeout)
    #[error("Connection to {} failed: {source}", .endpoint.display())]
    ConnectionFailed {
        /// The candidate that could not be opened
        endpoint: PathBuf,
        /// Underlying connect error
        #[source]
        source: io::Error,
    },

    /// The peer answered the handshake with a `Close` frame
    #[error("Handshake rejected by peer (code {code}): {message}")]
    HandshakeRejected {
        /// Close code sent by the peer (0 when absent)
        code: i64,
        /// Human readable reason sent by the peer
        message: String,
    },

    /// The peer sent data that does not follow the framing rules
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Transport read/write failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PresenceError {
    /// Whether this error means the connection went away under a write
    ///
    /// Only these errors trigger the single reconnect-and-retry on the write path.
    #[must_use]
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            Self::Io(e) => is_broken_pipe(e),
            _ => false,
        }
    }
}

/// Classify an I/O error as "peer went away"
pub(crate) fn is_broken_pipe(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted
    )
}

/// Result type alias using `PresenceError`
pub type Result<T> = std::result::Result<T, PresenceError>;
