//! Transport Layer for the Presence IPC Protocol
//!
//! - [`frame`]: opcode + length framing of JSON payloads
//! - [`connector`]: local duplex streams (Unix sockets, named pipes)
//! - [`locator`]: finding the peer's listening endpoint
//!
//! # Design Philosophy
//!
//! The session logic above this layer is platform-agnostic. Only the
//! connector and the endpoint naming rule differ between Unix and Windows,
//! and both are selected at compile time.

pub mod connector;
pub mod frame;
pub mod locator;

// Re-exports for convenience
pub use connector::{Connector, DefaultConnector};
pub use frame::{Frame, Opcode};
pub use locator::EndpointLocator;

#[cfg(unix)]
pub use connector::UnixConnector;

#[cfg(windows)]
pub use connector::NamedPipeConnector;
