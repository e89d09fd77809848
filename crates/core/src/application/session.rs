// Persistent Session
// One long-lived connection: a reader task resolves calls by id while callers
// share the write half behind a mutex.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::codec;
use super::correlator::{Correlator, Resolution};
use crate::error::{Result, RpcError};
use crate::port::{CallObserver, Connection, Connector, FrameReader, FrameWriter, TimeProvider, TransportError};

pub(crate) struct Session {
    endpoint: String,
    writer: Mutex<Box<dyn FrameWriter>>,
    correlator: Correlator,
    reader_task: JoinHandle<()>,
}

impl Session {
    pub(crate) async fn open(
        connector: &dyn Connector,
        time_provider: Arc<dyn TimeProvider>,
        observer: Arc<dyn CallObserver>,
    ) -> Result<Arc<Self>> {
        let endpoint = connector.endpoint();
        let Connection { reader, writer } = connector.open().await?;
        let correlator = Correlator::new(time_provider);

        let reader_task = tokio::spawn(read_loop(
            reader,
            correlator.clone(),
            observer,
            endpoint.clone(),
        ));

        info!(endpoint = %endpoint, "Persistent connection opened");

        Ok(Arc::new(Self {
            endpoint,
            writer: Mutex::new(writer),
            correlator,
            reader_task,
        }))
    }

    pub(crate) fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub(crate) fn is_alive(&self) -> bool {
        !self.correlator.is_closed()
    }

    /// Write one frame; concurrent writers never interleave bytes
    ///
    /// A write cancelled part way (caller timed out) may leave half a frame
    /// on the wire, so it kills the session: every pending call fails and the
    /// next call reconnects.
    ///
    /// # Errors
    /// - RpcError::ConnectionLost if the session died while waiting to write
    /// - RpcError::Io if the write itself failed
    pub(crate) async fn write(&self, frame: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        if self.correlator.is_closed() {
            return Err(RpcError::ConnectionLost);
        }

        let mut guard = UnfinishedWrite {
            correlator: &self.correlator,
            endpoint: &self.endpoint,
            armed: true,
        };
        let written = writer.write_frame(frame).await.map_err(RpcError::from);
        guard.armed = false;
        written
    }

    /// Tear down: outstanding calls resolve `ConnectionLost`
    pub(crate) async fn close(&self) {
        let failed = self.correlator.fail_all();
        self.writer.lock().await.close().await;
        self.reader_task.abort();
        info!(endpoint = %self.endpoint, failed_calls = failed, "Persistent connection closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.correlator.fail_all();
        self.reader_task.abort();
    }
}

/// Tears the session down if dropped before the write finished
struct UnfinishedWrite<'a> {
    correlator: &'a Correlator,
    endpoint: &'a str,
    armed: bool,
}

impl Drop for UnfinishedWrite<'_> {
    fn drop(&mut self) {
        if self.armed {
            let failed = self.correlator.fail_all();
            warn!(endpoint = %self.endpoint, failed_calls = failed, "Write cancelled mid-frame, dropping connection");
        }
    }
}

async fn read_loop(
    mut reader: Box<dyn FrameReader>,
    correlator: Correlator,
    observer: Arc<dyn CallObserver>,
    endpoint: String,
) {
    loop {
        let frame = match reader.read_frame().await {
            Ok(frame) => frame,
            Err(TransportError::Closed) => {
                debug!(endpoint = %endpoint, "Daemon closed the connection");
                break;
            }
            Err(e) => {
                let err = RpcError::from(e);
                warn!(endpoint = %endpoint, error = %err, "Read failed, dropping connection");
                if err.is_protocol_violation() {
                    observer.on_protocol_violation(&err);
                }
                break;
            }
        };

        let response = match codec::decode_response(&frame) {
            Ok(response) => response,
            Err(e) => {
                observer.on_protocol_violation(&e);
                // Framing still holds; only the call it names is failed
                if let Some(id) = codec::response_id(&frame) {
                    warn!(endpoint = %endpoint, id = %id, error = %e, "Malformed response");
                    if let Err(unknown) = correlator.reject(&id, e) {
                        observer.on_protocol_violation(&unknown);
                    }
                    continue;
                }
                // Without a trustworthy id the stream can't be correlated any more
                warn!(endpoint = %endpoint, error = %e, "Undecodable response, dropping connection");
                break;
            }
        };

        match correlator.resolve(response) {
            Ok(Resolution::Delivered) | Ok(Resolution::Abandoned) => {}
            Err(e) => observer.on_protocol_violation(&e),
        }
    }

    let failed = correlator.fail_all();
    if failed > 0 {
        warn!(endpoint = %endpoint, failed_calls = failed, "Connection lost with calls outstanding");
    }
}
