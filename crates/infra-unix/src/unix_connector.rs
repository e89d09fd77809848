// Unix socket connector
// reason: tokio UnixStream split into owned halves so a reader task can own one side
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tracing::{debug, warn};

use lightning_rpc_core::application::FrameDecoder;
use lightning_rpc_core::config::constants::{
    DEFAULT_MAX_FRAME_BYTES, DEFAULT_SOCKET_PATH, READ_CHUNK_BYTES,
};
use lightning_rpc_core::port::{Connection, Connector, FrameReader, FrameWriter, TransportError};

/// Connector for a daemon listening on a Unix domain socket
#[derive(Debug, Clone)]
pub struct UnixConnector {
    socket_path: PathBuf,
    max_frame_bytes: usize,
}

impl UnixConnector {
    /// Create a connector for `socket_path`
    ///
    /// A leading `~` is expanded to the home directory.
    ///
    /// # Example
    /// ```ignore
    /// let connector = UnixConnector::new("~/.lightning/lightning-rpc");
    /// ```
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        let raw = socket_path.as_ref().to_string_lossy();
        Self {
            socket_path: shellexpand::tilde(&raw).into_owned().into(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Default for UnixConnector {
    fn default() -> Self {
        Self::new(DEFAULT_SOCKET_PATH)
    }
}

#[async_trait]
impl Connector for UnixConnector {
    async fn open(&self) -> Result<Connection, TransportError> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| TransportError::Connect {
                endpoint: self.endpoint(),
                source,
            })?;
        debug!(socket = %self.socket_path.display(), "Connected to daemon");

        let (read_half, write_half) = stream.into_split();
        Ok(Connection::new(
            Box::new(UnixFrameReader::new(read_half, self.max_frame_bytes)),
            Box::new(UnixFrameWriter::new(write_half)),
        ))
    }

    fn endpoint(&self) -> String {
        self.socket_path.display().to_string()
    }
}

/// Read half: cuts the byte stream into JSON values
pub struct UnixFrameReader {
    stream: OwnedReadHalf,
    decoder: FrameDecoder,
    chunk: Vec<u8>,
}

impl UnixFrameReader {
    pub fn new(stream: OwnedReadHalf, max_frame_bytes: usize) -> Self {
        Self {
            stream,
            decoder: FrameDecoder::new(max_frame_bytes),
            chunk: vec![0; READ_CHUNK_BYTES],
        }
    }
}

#[async_trait]
impl FrameReader for UnixFrameReader {
    async fn read_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        loop {
            if let Some(frame) = self.decoder.next_frame()? {
                return Ok(frame);
            }

            let n = self.stream.read(&mut self.chunk).await?;
            if n == 0 {
                if self.decoder.has_partial_frame() {
                    warn!("Daemon closed the socket in the middle of a response");
                    return Err(TransportError::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "connection closed inside a JSON value",
                    )));
                }
                return Err(TransportError::Closed);
            }
            self.decoder.extend(&self.chunk[..n]);
        }
    }
}

/// Write half: one request per `write_frame`, flushed immediately
pub struct UnixFrameWriter {
    stream: OwnedWriteHalf,
    closed: bool,
}

impl UnixFrameWriter {
    pub fn new(stream: OwnedWriteHalf) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

#[async_trait]
impl FrameWriter for UnixFrameWriter {
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Io(std::io::Error::from(
                std::io::ErrorKind::NotConnected,
            )));
        }
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "Socket shutdown failed");
        }
    }
}
