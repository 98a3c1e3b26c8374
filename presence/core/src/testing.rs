//! Scripted peers for unit tests
//!
//! `ScriptedStream` replays canned reads and records writes; `ScriptedConnector`
//! maps endpoint paths to outcomes and records every connect attempt.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::transport::connector::Connector;
use crate::transport::frame::{encode, Opcode};

#[derive(Debug)]
enum ReadStep {
    Data(Vec<u8>),
    Error(io::ErrorKind),
    Pending,
}

#[derive(Debug, Default)]
struct StreamLog {
    written: Vec<Vec<u8>>,
    shut_down: bool,
}

/// Observes what was written to a `ScriptedStream` after it has been moved
#[derive(Clone, Debug, Default)]
pub struct StreamHandle {
    log: Arc<Mutex<StreamLog>>,
}

impl StreamHandle {
    /// Buffers passed to each successful `poll_write`
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.log.lock().unwrap().written.clone()
    }

    /// Whether `poll_shutdown` was called
    pub fn is_shut_down(&self) -> bool {
        self.log.lock().unwrap().shut_down
    }
}

/// In-memory stream with scripted reads and recorded writes
#[derive(Debug, Default)]
pub struct ScriptedStream {
    reads: VecDeque<ReadStep>,
    write_failure: Option<(usize, io::ErrorKind)>,
    write_stall: Option<usize>,
    shutdown_failure: Option<io::ErrorKind>,
    handle: StreamHandle,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes returned by one read
    pub fn read(mut self, data: &[u8]) -> Self {
        self.reads.push_back(ReadStep::Data(data.to_vec()));
        self
    }

    /// Queue one encoded frame returned by one read
    pub fn read_frame(self, opcode: Opcode, json: &str) -> Self {
        let bytes = encode(opcode, json.as_bytes()).unwrap();
        self.read(&bytes)
    }

    /// Queue the peer's handshake acknowledgement
    pub fn ack_handshake(self) -> Self {
        self.read_frame(
            Opcode::Frame,
            r#"{"cmd":"DISPATCH","evt":"READY","data":{"v":1}}"#,
        )
    }

    /// Queue a read error
    pub fn read_error(mut self, kind: io::ErrorKind) -> Self {
        self.reads.push_back(ReadStep::Error(kind));
        self
    }

    /// Block every read from here on
    pub fn read_pending(mut self) -> Self {
        self.reads.push_back(ReadStep::Pending);
        self
    }

    /// Fail every write after `successful` writes have gone through
    pub fn fail_writes_after(mut self, successful: usize, kind: io::ErrorKind) -> Self {
        self.write_failure = Some((successful, kind));
        self
    }

    /// Never complete a write after `successful` writes have gone through
    pub fn stall_writes_after(mut self, successful: usize) -> Self {
        self.write_stall = Some(successful);
        self
    }

    /// Fail `poll_shutdown`
    pub fn fail_shutdown(mut self, kind: io::ErrorKind) -> Self {
        self.shutdown_failure = Some(kind);
        self
    }

    pub fn handle(&self) -> StreamHandle {
        self.handle.clone()
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if matches!(this.reads.front(), Some(ReadStep::Pending)) {
            return Poll::Pending;
        }
        match this.reads.pop_front() {
            Some(ReadStep::Data(data)) => {
                let n = data.len().min(buf.remaining());
                buf.put_slice(&data[..n]);
                Poll::Ready(Ok(()))
            }
            Some(ReadStep::Error(kind)) => Poll::Ready(Err(io::Error::from(kind))),
            // End of stream
            Some(ReadStep::Pending) | None => Poll::Ready(Ok(())),
        }
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let mut log = this.handle.log.lock().unwrap();

        if let Some((successful, kind)) = this.write_failure {
            if log.written.len() >= successful {
                return Poll::Ready(Err(io::Error::from(kind)));
            }
        }
        if this.write_stall.is_some_and(|successful| log.written.len() >= successful) {
            return Poll::Pending;
        }

        log.written.push(buf.to_vec());
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.handle.log.lock().unwrap().shut_down = true;

        match this.shutdown_failure {
            Some(kind) => Poll::Ready(Err(io::Error::from(kind))),
            None => Poll::Ready(Ok(())),
        }
    }
}

enum Outcome {
    Listen(VecDeque<ScriptedStream>),
    Refuse(io::ErrorKind),
    Hang,
}

#[derive(Default)]
struct ConnectorState {
    endpoints: HashMap<PathBuf, Outcome>,
    attempts: Vec<PathBuf>,
    connections: usize,
}

/// Connector over a scripted set of endpoints
///
/// Endpoints without a script report `NotFound`. A listening endpoint hands
/// out its queued streams in order and reports `NotFound` once drained.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a stream handed out by the next connect to `endpoint`
    pub fn listen(&self, endpoint: &Path, stream: ScriptedStream) {
        let mut state = self.state.lock().unwrap();
        let outcome = state
            .endpoints
            .entry(endpoint.to_path_buf())
            .or_insert_with(|| Outcome::Listen(VecDeque::new()));
        if let Outcome::Listen(queue) = outcome {
            queue.push_back(stream);
        }
    }

    /// Make connects to `endpoint` fail with `kind`
    pub fn refuse(&self, endpoint: &Path, kind: io::ErrorKind) {
        self.state
            .lock()
            .unwrap()
            .endpoints
            .insert(endpoint.to_path_buf(), Outcome::Refuse(kind));
    }

    /// Make connects to `endpoint` never complete
    pub fn hang(&self, endpoint: &Path) {
        self.state
            .lock()
            .unwrap()
            .endpoints
            .insert(endpoint.to_path_buf(), Outcome::Hang);
    }

    /// Every endpoint a connect was attempted on, in order
    pub fn attempts(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().attempts.clone()
    }

    /// Number of connects that produced a stream
    pub fn connections(&self) -> usize {
        self.state.lock().unwrap().connections
    }
}

enum Attempt {
    Connected(ScriptedStream),
    Failed(io::ErrorKind),
    Hang,
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Stream = ScriptedStream;

    async fn connect(&self, endpoint: &Path) -> io::Result<ScriptedStream> {
        let attempt = {
            let mut state = self.state.lock().unwrap();
            state.attempts.push(endpoint.to_path_buf());

            let attempt = match state.endpoints.get_mut(endpoint) {
                Some(Outcome::Listen(queue)) => queue
                    .pop_front()
                    .map_or(Attempt::Failed(io::ErrorKind::NotFound), Attempt::Connected),
                Some(Outcome::Refuse(kind)) => Attempt::Failed(*kind),
                Some(Outcome::Hang) => Attempt::Hang,
                None => Attempt::Failed(io::ErrorKind::NotFound),
            };
            if matches!(attempt, Attempt::Connected(_)) {
                state.connections += 1;
            }
            attempt
        };

        match attempt {
            Attempt::Connected(stream) => Ok(stream),
            Attempt::Failed(kind) => Err(io::Error::from(kind)),
            Attempt::Hang => std::future::pending().await,
        }
    }
}
