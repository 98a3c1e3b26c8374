//! Presence Core - Rich Presence IPC Client
//!
//! Reports "rich presence" activity to a desktop application listening on a
//! local endpoint: a Unix domain socket on Unix, a named pipe on Windows.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Session                             │
//! │   ensure_connected · send · receive · close · publish        │
//! │                              │                               │
//! │         ┌────────────────────┴─────────────────────┐         │
//! │         │                                          │         │
//! │  ┌──────┴────────┐                        ┌────────┴──────┐  │
//! │  │EndpointLocator│  candidates → connect  │  Frame codec  │  │
//! │  └──────┬────────┘                        └───────────────┘  │
//! │         │                                                    │
//! │  ┌──────┴──────────────────────────┐                         │
//! │  │ Connector (UnixStream / pipe)   │                         │
//! │  └─────────────────────────────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Session`]: owns one connection, handshakes lazily, reconnects once on a broken write
//! - [`EndpointLocator`]: scans endpoint candidates for the peer
//! - [`Frame`] / [`Opcode`]: the unit of exchange on the wire
//! - [`Activity`]: what the peer displays
//!
//! # Quick Start
//!
//! ```ignore
//! use presence_core::{Activity, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> presence_core::Result<()> {
//!     let mut session = Session::new(SessionConfig::new("975346661540909056"))?;
//!
//!     session
//!         .publish_activity(&Activity {
//!             details: "Editing".to_string(),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     // The peer keeps the activity while the connection stays open.
//!     tokio::time::sleep(std::time::Duration::from_secs(30)).await;
//!     session.close().await
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod activity;
pub mod config;
pub mod error;
pub mod messages;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use activity::{Activity, Assets, Button, Party, Secrets, Timestamps};
pub use config::SessionConfig;
pub use error::{PresenceError, Result};
pub use messages::{Command, ErrorData, Handshake, Response, SetActivity};
pub use session::Session;
pub use transport::{Connector, DefaultConnector, EndpointLocator, Frame, Opcode};
