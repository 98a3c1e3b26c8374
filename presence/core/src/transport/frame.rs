//! Frame Protocol
//!
//! Wire format for messages exchanged with the presence peer: an opcode and a
//! payload length followed by a UTF-8 JSON payload.
//!
//! # Frame Format
//!
//! ```text
//! +----------------+----------------+------------------------------------------+
//! | Opcode (4)     | Length (4)     | JSON Payload (variable)                  |
//! | little-endian  | little-endian  | Handshake, Command, or peer Response     |
//! +----------------+----------------+------------------------------------------+
//! ```
//!
//! Both header integers are little-endian regardless of the host platform.
//! There is no checksum, no compression and no multiplexing id.
//!
//! # Decoding
//!
//! The peer's replies arrive in a single read. Decoding works on one read
//! buffer and does not accumulate partial reads: a buffer of 8 bytes or fewer
//! carries no payload and is rejected as a protocol violation.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{PresenceError, Result};

/// Frame header size: 4 bytes opcode + 4 bytes length
pub const HEADER_SIZE: usize = 8;

/// Frame opcodes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Opcode {
    /// First exchange on a connection: protocol version and client id
    Handshake = 0,
    /// Application command or response
    Frame = 1,
    /// Connection is being closed, payload carries the reason
    Close = 2,
    /// Keep-alive request (reserved)
    Ping = 3,
    /// Keep-alive reply (reserved)
    Pong = 4,
}

impl Opcode {
    /// Raw wire value
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for Opcode {
    type Error = PresenceError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Handshake),
            1 => Ok(Self::Frame),
            2 => Ok(Self::Close),
            3 => Ok(Self::Ping),
            4 => Ok(Self::Pong),
            other => Err(PresenceError::ProtocolViolation(format!(
                "unknown opcode {other}"
            ))),
        }
    }
}

/// One decoded protocol message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// What the frame is for
    pub opcode: Opcode,
    /// Raw payload bytes (UTF-8 JSON)
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a frame from an opcode and raw payload
    #[must_use]
    pub fn new(opcode: Opcode, payload: Vec<u8>) -> Self {
        Self { opcode, payload }
    }

    /// Deserialize the payload as JSON
    ///
    /// # Errors
    ///
    /// Returns `PresenceError::Serialization` if the payload is not valid
    /// JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Encode this frame to its wire representation
    ///
    /// # Errors
    ///
    /// Returns `PresenceError::ProtocolViolation` if the payload length does
    /// not fit the 32-bit length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self.opcode, &self.payload)
    }
}

/// Encode an opcode and raw payload into a frame
///
/// # Errors
///
/// Returns `PresenceError::ProtocolViolation` if the payload length does not
/// fit the 32-bit length field.
pub fn encode(opcode: Opcode, payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        PresenceError::ProtocolViolation(format!(
            "payload of {} bytes does not fit a frame",
            payload.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&opcode.as_u32().to_le_bytes());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Serialize a message to JSON and encode it into a frame
///
/// # Errors
///
/// Returns `PresenceError::Serialization` if JSON serialization fails.
pub fn encode_json<T: Serialize + ?Sized>(opcode: Opcode, msg: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(msg)?;
    encode(opcode, &json)
}

/// Decode one frame from the bytes returned by a single read
///
/// The payload is everything after the header, whatever the declared length
/// says. Only the total size and the opcode are validated.
///
/// # Errors
///
/// Returns `PresenceError::ProtocolViolation` if the buffer holds 8 bytes or
/// fewer, or if the opcode is unknown.
pub fn decode(buf: &[u8]) -> Result<Frame> {
    if buf.len() <= HEADER_SIZE {
        return Err(PresenceError::ProtocolViolation(format!(
            "short read: {} bytes, frame needs more than {HEADER_SIZE}",
            buf.len()
        )));
    }

    let opcode = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let declared = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;
    let payload = &buf[HEADER_SIZE..];

    if declared != payload.len() {
        tracing::trace!(
            declared,
            actual = payload.len(),
            "Frame length differs from bytes read"
        );
    }

    Ok(Frame {
        opcode: Opcode::try_from(opcode)?,
        payload: payload.to_vec(),
    })
}
