//! Protocol Messages
//!
//! JSON payloads carried inside frames: the handshake sent on every new
//! connection, the `SET_ACTIVITY` command, and the peer's replies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::activity::Activity;

/// Protocol version announced in the handshake
pub const PROTOCOL_VERSION: &str = "1";

/// Command name for publishing presence
pub const SET_ACTIVITY: &str = "SET_ACTIVITY";

/// Event name the peer uses for failed commands
pub const ERROR_EVENT: &str = "ERROR";

/// First payload on every connection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    /// Protocol version, always [`PROTOCOL_VERSION`]
    pub v: String,
    /// Application id registered with the peer
    pub client_id: String,
}

impl Handshake {
    /// Handshake for the given application id
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            v: PROTOCOL_VERSION.to_string(),
            client_id: client_id.into(),
        }
    }
}

/// Header shared by every outbound command
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Command name
    pub cmd: String,
    /// Event name, empty for plain commands
    pub evt: String,
    /// Correlation token echoed back by the peer
    pub nonce: String,
}

impl Command {
    /// Header for `cmd` with a fresh nonce
    pub fn new(cmd: impl Into<String>) -> Self {
        Self::with_event(cmd, "")
    }

    /// Header for `cmd` about event `evt` with a fresh nonce
    pub fn with_event(cmd: impl Into<String>, evt: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            evt: evt.into(),
            nonce: Uuid::new_v4().to_string(),
        }
    }
}

/// `SET_ACTIVITY` command
#[derive(Clone, Debug, Serialize)]
pub struct SetActivity<'a> {
    /// Command header
    #[serde(flatten)]
    pub command: Command,
    /// Command arguments
    pub args: SetActivityArgs<'a>,
}

/// Arguments of `SET_ACTIVITY`
#[derive(Clone, Debug, Serialize)]
pub struct SetActivityArgs<'a> {
    /// Process the activity belongs to
    pub pid: u32,
    /// Activity to show; `null` clears it
    pub activity: Option<&'a Activity>,
}

impl<'a> SetActivity<'a> {
    /// Publish `activity` (or clear it with `None`) for process `pid`
    #[must_use]
    pub fn new(pid: u32, activity: Option<&'a Activity>) -> Self {
        Self {
            command: Command::new(SET_ACTIVITY),
            args: SetActivityArgs { pid, activity },
        }
    }
}

/// Reply from the peer to a command
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Response {
    /// Command being answered
    #[serde(default)]
    pub cmd: Option<String>,
    /// Event name, `ERROR` when the command failed
    #[serde(default)]
    pub evt: Option<String>,
    /// Nonce of the command being answered
    #[serde(default)]
    pub nonce: Option<String>,
    /// Command-specific result
    #[serde(default)]
    pub data: Option<Value>,
}

impl Response {
    /// Error details when the peer rejected the command
    #[must_use]
    pub fn error(&self) -> Option<ErrorData> {
        if self.evt.as_deref() != Some(ERROR_EVENT) {
            return None;
        }
        self.data
            .clone()
            .and_then(|data| serde_json::from_value(data).ok())
    }
}

/// Error payload of a failed command or a `Close` frame
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorData {
    /// Numeric error code
    #[serde(default)]
    pub code: i64,
    /// Human readable description
    #[serde(default)]
    pub message: String,
}
