//! Local duplex byte streams
//!
//! The session and locator only need "open a local stream by name". Which
//! operating system primitive backs it is chosen at compile time:
//!
//! - Unix: Unix domain sockets (`tokio::net::UnixStream`)
//! - Windows: named pipes (`tokio::net::windows::named_pipe::NamedPipeClient`)

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Opens a connection to one endpoint candidate
///
/// Implementations must report a missing endpoint with
/// `io::ErrorKind::NotFound` so the locator can move on to the next candidate.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The connected stream type
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to the endpoint at `endpoint`
    async fn connect(&self, endpoint: &Path) -> io::Result<Self::Stream>;
}

// ============================================================================
// Unix Implementation
// ============================================================================

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use tokio::net::UnixStream;

    /// Connects to Unix domain sockets
    #[derive(Clone, Copy, Debug, Default)]
    pub struct UnixConnector;

    #[async_trait]
    impl Connector for UnixConnector {
        type Stream = UnixStream;

        async fn connect(&self, endpoint: &Path) -> io::Result<UnixStream> {
            UnixStream::connect(endpoint).await
        }
    }
}

// ============================================================================
// Windows Implementation
// ============================================================================

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient};

    /// Connects to named pipes
    #[derive(Clone, Copy, Debug, Default)]
    pub struct NamedPipeConnector;

    #[async_trait]
    impl Connector for NamedPipeConnector {
        type Stream = NamedPipeClient;

        async fn connect(&self, endpoint: &Path) -> io::Result<NamedPipeClient> {
            // ERROR_FILE_NOT_FOUND maps to io::ErrorKind::NotFound
            ClientOptions::new().open(endpoint)
        }
    }
}

#[cfg(unix)]
pub use unix_impl::UnixConnector;

#[cfg(windows)]
pub use windows_impl::NamedPipeConnector;

/// Connector for the host platform
#[cfg(unix)]
pub type DefaultConnector = UnixConnector;

/// Connector for the host platform
#[cfg(windows)]
pub type DefaultConnector = NamedPipeConnector;
