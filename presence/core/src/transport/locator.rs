//! Endpoint Locator
//!
//! Finds the peer's listening endpoint. The desktop application binds the
//! first free of several numbered slots, possibly inside a sandbox-specific
//! subdirectory, so the locator scans candidates in a fixed order and returns
//! the first one that accepts a connection.
//!
//! # Candidate Order
//!
//! Unix: `<base>/<subdir>/discord-ipc-<i>` for every subdirectory (in order),
//! then every index `0..10` (ascending). `<base>` is the first non-empty of
//! `XDG_RUNTIME_DIR`, `TMPDIR`, `TMP`, `TEMP`, else `/tmp`.
//!
//! Windows: `\\.\pipe\discord-ipc-<i>` for every index.
//!
//! # Failure Policy
//!
//! A candidate that does not exist is skipped. Any other connect failure
//! (refused, permission denied, timeout) stops the scan and is reported as
//! `ConnectionFailed`. Running out of candidates is `PeerNotRunning`.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use super::connector::{Connector, DefaultConnector};
use crate::error::{PresenceError, Result};

/// File name prefix of every endpoint
pub const ENDPOINT_PREFIX: &str = "discord-ipc-";

/// Number of numbered slots the peer may bind
pub const ENDPOINT_SLOTS: u32 = 10;

/// Environment variables consulted for the base directory, in priority order
pub const BASE_DIR_ENV_VARS: [&str; 4] = ["XDG_RUNTIME_DIR", "TMPDIR", "TMP", "TEMP"];

/// Base directory when no environment variable is set
pub const DEFAULT_BASE_DIR: &str = "/tmp";

/// Known deployment variants: default install, Flatpak, Snap
pub const SUBDIRECTORIES: [&str; 3] = ["", "app/com.discordapp.Discord", "snap.discord"];

/// Named pipe namespace on Windows
pub const PIPE_NAMESPACE: &str = r"\\.\pipe\";

/// Default per-candidate connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve the base directory from an environment lookup
///
/// Uses the first variable of [`BASE_DIR_ENV_VARS`] bound to a non-empty
/// value, otherwise [`DEFAULT_BASE_DIR`].
pub fn resolve_base_dir<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    BASE_DIR_ENV_VARS
        .iter()
        .filter_map(|name| lookup(*name))
        .find(|value| !value.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_BASE_DIR), PathBuf::from)
}

/// All socket candidates under `base`, in scan order
#[must_use]
pub fn candidate_endpoints_in(base: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(SUBDIRECTORIES.len() * ENDPOINT_SLOTS as usize);

    for subdir in SUBDIRECTORIES {
        let dir = if subdir.is_empty() {
            base.to_path_buf()
        } else {
            base.join(subdir)
        };

        for index in 0..ENDPOINT_SLOTS {
            candidates.push(dir.join(format!("{ENDPOINT_PREFIX}{index}")));
        }
    }

    candidates
}

/// All named pipe candidates, in scan order
#[must_use]
pub fn pipe_endpoints() -> Vec<PathBuf> {
    (0..ENDPOINT_SLOTS)
        .map(|index| PathBuf::from(format!("{PIPE_NAMESPACE}{ENDPOINT_PREFIX}{index}")))
        .collect()
}

/// Candidates for the host platform, reading the process environment
#[cfg(unix)]
#[must_use]
pub fn default_candidates() -> Vec<PathBuf> {
    let base = resolve_base_dir(|name| std::env::var(name).ok());
    candidate_endpoints_in(&base)
}

/// Candidates for the host platform
#[cfg(windows)]
#[must_use]
pub fn default_candidates() -> Vec<PathBuf> {
    pipe_endpoints()
}

/// Scans endpoint candidates and returns the first connected stream
#[derive(Debug)]
pub struct EndpointLocator<C = DefaultConnector> {
    connector: C,
    candidates: Vec<PathBuf>,
    connect_timeout: Duration,
}

impl EndpointLocator<DefaultConnector> {
    /// Locator for the host platform using the process environment
    #[must_use]
    pub fn from_env(connect_timeout: Duration) -> Self {
        Self::new(DefaultConnector::default(), default_candidates(), connect_timeout)
    }
}

impl<C: Connector> EndpointLocator<C> {
    /// Create a locator over an explicit candidate list
    pub fn new(connector: C, candidates: Vec<PathBuf>, connect_timeout: Duration) -> Self {
        Self {
            connector,
            candidates,
            connect_timeout,
        }
    }

    /// Candidates in the order they are tried
    #[must_use]
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Per-candidate connect timeout
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Connect to the first reachable candidate
    ///
    /// # Errors
    ///
    /// - `PresenceError::ConnectionFailed` if a candidate exists but cannot be opened
    /// - `PresenceError::PeerNotRunning` if no candidate exists
    pub async fn locate(&self) -> Result<C::Stream> {
        for endpoint in &self.candidates {
            debug!(endpoint = %endpoint.display(), "Trying endpoint");

            let attempt =
                tokio::time::timeout(self.connect_timeout, self.connector.connect(endpoint)).await;

            match attempt {
                Ok(Ok(stream)) => {
                    info!(endpoint = %endpoint.display(), "Connected to peer");
                    return Ok(stream);
                }
                Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => continue,
                Ok(Err(e)) => {
                    return Err(PresenceError::ConnectionFailed {
                        endpoint: endpoint.clone(),
                        source: e,
                    });
                }
                Err(_) => {
                    return Err(PresenceError::ConnectionFailed {
                        endpoint: endpoint.clone(),
                        source: io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("no connection within {:?}", self.connect_timeout),
                        ),
                    });
                }
            }
        }

        debug!(candidates = self.candidates.len(), "No endpoint found");
        Err(PresenceError::PeerNotRunning)
    }
}
