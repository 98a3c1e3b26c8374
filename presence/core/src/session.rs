//! Session Management
//!
//! A [`Session`] owns at most one connection to the peer and hides its
//! lifecycle from callers: the first `send` or `receive` locates the peer and
//! performs the handshake, and a connection that breaks under a write is
//! replaced once before the error reaches the caller.
//!
//! # Lifecycle
//!
//! ```text
//!                 locate + handshake ok
//!  Disconnected ─────────────────────────► Connected
//!       ▲                                      │
//!       └──────────────────────────────────────┘
//!         close / read error / peer Close frame /
//!         write error (after any retry)
//! ```
//!
//! # Concurrency
//!
//! A session is not internally synchronized. Every operation takes
//! `&mut self`; share one between tasks behind a `tokio::sync::Mutex` or give
//! it a single owning task. No background task is spawned.

use std::future::Future;
use std::io;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::activity::Activity;
use crate::config::SessionConfig;
use crate::error::{is_broken_pipe, PresenceError, Result};
use crate::messages::{ErrorData, Handshake, SetActivity};
use crate::transport::connector::{Connector, DefaultConnector};
use crate::transport::frame::{self, Frame, Opcode};
use crate::transport::locator::EndpointLocator;

/// Connection state owned by a session
enum SessionState<S> {
    Disconnected,
    Connected(S),
}

/// A self-healing connection to the presence peer
pub struct Session<C: Connector = DefaultConnector> {
    client_id: String,
    locator: EndpointLocator<C>,
    io_timeout: Option<Duration>,
    read_buffer_size: usize,
    state: SessionState<C::Stream>,
}

impl Session<DefaultConnector> {
    /// Create a session for the host platform
    ///
    /// Endpoint candidates are resolved from the process environment once,
    /// here. No connection is made until the first operation.
    ///
    /// # Errors
    ///
    /// Returns `PresenceError::InvalidConfig` if the configuration is invalid
    /// (for example an empty client id).
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let locator = EndpointLocator::from_env(config.connect_timeout());
        Self::with_locator(config, locator)
    }
}

impl<C: Connector> Session<C> {
    /// Create a session that finds the peer through `locator`
    ///
    /// The locator's own connect timeout applies; `config.connect_timeout_ms`
    /// is not consulted.
    ///
    /// # Errors
    ///
    /// Returns `PresenceError::InvalidConfig` if the configuration is invalid.
    pub fn with_locator(config: SessionConfig, locator: EndpointLocator<C>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            io_timeout: config.io_timeout(),
            read_buffer_size: config.read_buffer_size,
            client_id: config.client_id,
            locator,
            state: SessionState::Disconnected,
        })
    }

    /// Application id sent in the handshake
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Whether a handshaken connection is currently held
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    /// Connect and handshake unless already connected
    ///
    /// # Errors
    ///
    /// Propagates locator and I/O errors. Returns
    /// `PresenceError::HandshakeRejected` if the peer answers the handshake
    /// with a `Close` frame. The session stays disconnected on any error.
    pub async fn ensure_connected(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let mut stream = self.locator.locate().await?;

        let handshake = frame::encode_json(Opcode::Handshake, &Handshake::new(&self.client_id))?;
        write_frame(&mut stream, &handshake, self.io_timeout).await?;
        debug!(client_id = %self.client_id, "Handshake sent");

        let ack = read_frame(&mut stream, self.read_buffer_size, self.io_timeout).await?;
        if ack.opcode == Opcode::Close {
            let reason: ErrorData = ack.json().unwrap_or_default();
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "Shutdown after rejected handshake failed");
            }
            warn!(code = reason.code, message = %reason.message, "Peer rejected handshake");
            return Err(PresenceError::HandshakeRejected {
                code: reason.code,
                message: reason.message,
            });
        }

        info!(client_id = %self.client_id, "Handshake complete");
        self.state = SessionState::Connected(stream);
        Ok(())
    }

    /// Serialize `payload` to JSON and write it as one frame
    ///
    /// Connects first if needed. If the write fails because the connection
    /// went away (broken pipe, reset, aborted), the stale connection is
    /// dropped, a new one is established, and the write is retried once.
    ///
    /// # Errors
    ///
    /// - `PresenceError::Serialization` if the payload cannot be encoded
    /// - `PresenceError::Io` if the write (or its single retry) fails; the
    ///   session is disconnected afterwards
    /// - any error from [`ensure_connected`](Self::ensure_connected)
    pub async fn send<T>(&mut self, opcode: Opcode, payload: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.ensure_connected().await?;
        let bytes = frame::encode_json(opcode, payload)?;

        match self.write_connected(&bytes).await {
            Ok(()) => {
                debug!(opcode = ?opcode, len = bytes.len(), "Frame sent");
                Ok(())
            }
            Err(e) if is_broken_pipe(&e) => {
                warn!(error = %e, "Connection lost during write, reconnecting");
                self.discard_connection().await;
                self.ensure_connected().await?;

                if let Err(e) = self.write_connected(&bytes).await {
                    warn!(error = %e, "Write failed after reconnect");
                    self.discard_connection().await;
                    return Err(e.into());
                }

                debug!(opcode = ?opcode, len = bytes.len(), "Frame sent after reconnect");
                Ok(())
            }
            Err(e) => {
                // Part of the frame may already be on the wire.
                debug!(error = %e, "Write failed, dropping connection");
                self.discard_connection().await;
                Err(e.into())
            }
        }
    }

    /// Read one frame from the peer
    ///
    /// Connects first if needed. A `Close` frame disconnects the session and
    /// is still returned so the caller can inspect the reason. Reads are never
    /// retried.
    ///
    /// # Errors
    ///
    /// - `PresenceError::ProtocolViolation` for a read of 8 bytes or fewer or
    ///   an unknown opcode (the session stays connected)
    /// - `PresenceError::Io` for read failures and end of stream (the session
    ///   is disconnected)
    /// - any error from [`ensure_connected`](Self::ensure_connected)
    pub async fn receive(&mut self) -> Result<Frame> {
        self.ensure_connected().await?;

        let deadline = self.io_timeout;
        let size = self.read_buffer_size;
        let result = match &mut self.state {
            SessionState::Connected(stream) => read_frame(stream, size, deadline).await,
            SessionState::Disconnected => Err(not_connected().into()),
        };

        match result {
            Ok(frame) if frame.opcode == Opcode::Close => {
                warn!(
                    reason = %String::from_utf8_lossy(&frame.payload),
                    "Peer closed the connection"
                );
                self.discard_connection().await;
                Ok(frame)
            }
            Ok(frame) => {
                debug!(opcode = ?frame.opcode, len = frame.payload.len(), "Frame received");
                Ok(frame)
            }
            Err(PresenceError::Io(e)) => {
                debug!(error = %e, "Read failed, dropping connection");
                self.discard_connection().await;
                Err(e.into())
            }
            Err(e) => Err(e),
        }
    }

    /// Close the connection
    ///
    /// Closing a disconnected session does nothing. The connection is
    /// released even when shutting it down fails.
    ///
    /// # Errors
    ///
    /// Returns `PresenceError::Io` if the transport reports an error while
    /// shutting down.
    pub async fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Disconnected => Ok(()),
            SessionState::Connected(mut stream) => {
                let result = stream.shutdown().await;
                info!("Disconnected");
                Ok(result?)
            }
        }
    }

    /// Publish `activity` for this process and return the peer's reply
    ///
    /// # Errors
    ///
    /// Any error from [`send`](Self::send) or [`receive`](Self::receive).
    pub async fn publish_activity(&mut self, activity: &Activity) -> Result<Frame> {
        self.set_activity(Some(activity)).await
    }

    /// Remove this process's activity and return the peer's reply
    ///
    /// # Errors
    ///
    /// Any error from [`send`](Self::send) or [`receive`](Self::receive).
    pub async fn clear_activity(&mut self) -> Result<Frame> {
        self.set_activity(None).await
    }

    async fn set_activity(&mut self, activity: Option<&Activity>) -> Result<Frame> {
        let msg = SetActivity::new(std::process::id(), activity);
        debug!(nonce = %msg.command.nonce, clear = activity.is_none(), "Setting activity");

        self.send(Opcode::Frame, &msg).await?;
        self.receive().await
    }

    async fn write_connected(&mut self, bytes: &[u8]) -> io::Result<()> {
        let deadline = self.io_timeout;
        match &mut self.state {
            SessionState::Connected(stream) => write_frame(stream, bytes, deadline).await,
            SessionState::Disconnected => Err(not_connected()),
        }
    }

    /// Close a connection known to be unusable
    async fn discard_connection(&mut self) {
        if let Err(e) = self.close().await {
            debug!(error = %e, "Ignoring close error on stale connection");
        }
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "session is not connected")
}

/// Run `op` under an optional deadline, mapping expiry to `TimedOut`
async fn with_deadline<T, F>(deadline: Option<Duration>, op: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, op).await.unwrap_or_else(|_| {
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no progress within {limit:?}"),
            ))
        }),
        None => op.await,
    }
}

async fn write_frame<S>(stream: &mut S, bytes: &[u8], deadline: Option<Duration>) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    with_deadline(deadline, async {
        stream.write_all(bytes).await?;
        stream.flush().await
    })
    .await
}

async fn read_frame<S>(stream: &mut S, buffer_size: usize, deadline: Option<Duration>) -> Result<Frame>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; buffer_size];
    let n = with_deadline(deadline, stream.read(&mut buf)).await?;
    if n == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "peer closed the connection",
        )
        .into());
    }

    frame::decode(&buf[..n])
}
