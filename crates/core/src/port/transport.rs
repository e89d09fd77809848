// Transport Port
// Abstraction over the byte stream to the daemon (Unix socket in production)

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connect failed: {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed the stream cleanly between frames
    #[error("Connection closed by peer")]
    Closed,

    #[error("Frame exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

/// Write half of a connection
#[async_trait]
pub trait FrameWriter: Send {
    /// Write one encoded request and flush it
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Shut the write half down; idempotent
    async fn close(&mut self);
}

/// Read half of a connection
#[async_trait]
pub trait FrameReader: Send {
    /// Read exactly one complete JSON value
    ///
    /// # Errors
    /// - TransportError::Closed on EOF between values
    /// - TransportError::Io on read failure or EOF inside a value
    /// - TransportError::FrameTooLarge / InvalidFrame on framing violations
    async fn read_frame(&mut self) -> Result<Vec<u8>, TransportError>;
}

/// An open connection, split so a background task can own the reader
pub struct Connection {
    pub reader: Box<dyn FrameReader>,
    pub writer: Box<dyn FrameWriter>,
}

impl Connection {
    pub fn new(reader: Box<dyn FrameReader>, writer: Box<dyn FrameWriter>) -> Self {
        Self { reader, writer }
    }
}

/// Connector trait
///
/// Implementations:
/// - UnixConnector (infra-unix): tokio UnixStream to the daemon socket
/// - MockConnector: in-memory scripted daemon for tests
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection
    ///
    /// # Errors
    /// - TransportError::Connect if the endpoint is unreachable or refuses
    async fn open(&self) -> Result<Connection, TransportError>;

    /// Human-readable endpoint (socket path) for logs and errors
    fn endpoint(&self) -> String;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::Request;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};
    use tokio::sync::mpsc;

    /// What the scripted daemon does after receiving a request
    #[derive(Debug, Clone)]
    pub enum MockReply {
        /// Push these frames to the client's reader, in order
        Frames(Vec<Vec<u8>>),
        /// Say nothing
        Silence,
        /// Close the connection
        Hangup,
    }

    impl MockReply {
        pub fn json(value: serde_json::Value) -> Self {
            MockReply::Frames(vec![value.to_string().into_bytes()])
        }
    }

    type Responder = dyn Fn(&Request) -> MockReply + Send + Sync;

    /// In-memory connector driven by a responder closure
    pub struct MockConnector {
        responder: Arc<Responder>,
        refuse_connect: AtomicBool,
        fail_writes: Arc<AtomicBool>,
        stall_writes: Arc<AtomicBool>,
        opened: AtomicUsize,
        received: Arc<Mutex<Vec<Request>>>,
    }

    impl MockConnector {
        pub fn new<F>(responder: F) -> Self
        where
            F: Fn(&Request) -> MockReply + Send + Sync + 'static,
        {
            Self {
                responder: Arc::new(responder),
                refuse_connect: AtomicBool::new(false),
                fail_writes: Arc::new(AtomicBool::new(false)),
                stall_writes: Arc::new(AtomicBool::new(false)),
                opened: AtomicUsize::new(0),
                received: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Daemon that echoes each request's id with `result`
        pub fn replying_with(result: serde_json::Value) -> Self {
            Self::new(move |req| {
                MockReply::json(serde_json::json!({"id": req.id, "result": result}))
            })
        }

        pub fn refusing() -> Self {
            let connector = Self::new(|_| MockReply::Silence);
            connector.refuse_connect.store(true, Ordering::SeqCst);
            connector
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Writes hang as if the daemon stopped reading
        pub fn set_stall_writes(&self, stall: bool) {
            self.stall_writes.store(stall, Ordering::SeqCst);
        }

        pub fn open_count(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        /// Requests seen by the daemon side, in arrival order
        pub fn received(&self) -> Vec<Request> {
            self.received
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        async fn open(&self) -> Result<Connection, TransportError> {
            if self.refuse_connect.load(Ordering::SeqCst) {
                return Err(TransportError::Connect {
                    endpoint: self.endpoint(),
                    source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                });
            }
            self.opened.fetch_add(1, Ordering::SeqCst);

            let (tx, rx) = mpsc::unbounded_channel();
            let writer = MockWriter {
                tx: Some(tx),
                responder: self.responder.clone(),
                fail_writes: self.fail_writes.clone(),
                stall_writes: self.stall_writes.clone(),
                received: self.received.clone(),
            };
            Ok(Connection::new(
                Box::new(MockReader { rx }),
                Box::new(writer),
            ))
        }

        fn endpoint(&self) -> String {
            "mock://daemon".to_string()
        }
    }

    struct MockWriter {
        tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
        responder: Arc<Responder>,
        fail_writes: Arc<AtomicBool>,
        stall_writes: Arc<AtomicBool>,
        received: Arc<Mutex<Vec<Request>>>,
    }

    #[async_trait]
    impl FrameWriter for MockWriter {
        async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
            if self.fail_writes.load(Ordering::SeqCst) || self.tx.is_none() {
                return Err(TransportError::Io(std::io::Error::from(
                    std::io::ErrorKind::BrokenPipe,
                )));
            }
            if self.stall_writes.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }

            let request: Request = serde_json::from_slice(frame)
                .map_err(|e| TransportError::InvalidFrame(e.to_string()))?;
            self.received
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request.clone());

            match (self.responder)(&request) {
                MockReply::Frames(frames) => {
                    if let Some(tx) = &self.tx {
                        for frame in frames {
                            let _ = tx.send(frame);
                        }
                    }
                }
                MockReply::Silence => {}
                MockReply::Hangup => self.tx = None,
            }
            Ok(())
        }

        async fn close(&mut self) {
            self.tx = None;
        }
    }

    struct MockReader {
        rx: mpsc::UnboundedReceiver<Vec<u8>>,
    }

    #[async_trait]
    impl FrameReader for MockReader {
        async fn read_frame(&mut self) -> Result<Vec<u8>, TransportError> {
            self.rx.recv().await.ok_or(TransportError::Closed)
        }
    }
}
