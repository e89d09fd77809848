//! Fake Lightning daemon on a throwaway Unix socket
//!
//! Each test scripts the daemon with a closure from request to reply.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lightning_rpc_core::application::codec;
use lightning_rpc_core::domain::Request;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

/// What the daemon does with one request
pub enum DaemonReply {
    /// Write this JSON value followed by `\n`
    Json(Value),
    /// Write these bytes verbatim
    Raw(Vec<u8>),
    /// Write this JSON value after a pause, without blocking later requests
    Delayed(Duration, Value),
    /// Write these bytes, then close the connection
    Truncated(Vec<u8>),
    /// Never answer
    Silence,
    /// Close the connection
    Hangup,
}

type Handler = dyn Fn(&Request) -> DaemonReply + Send + Sync;

pub struct FakeDaemon {
    path: PathBuf,
    accept_task: JoinHandle<()>,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl FakeDaemon {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> DaemonReply + Send + Sync + 'static,
    {
        Self::spawn(None, handler)
    }

    /// Daemon that leaves its first connection unread for `pause`
    pub fn start_stalling_first<F>(pause: Duration, handler: F) -> Self
    where
        F: Fn(&Request) -> DaemonReply + Send + Sync + 'static,
    {
        Self::spawn(Some(pause), handler)
    }

    fn spawn<F>(first_read_delay: Option<Duration>, handler: F) -> Self
    where
        F: Fn(&Request) -> DaemonReply + Send + Sync + 'static,
    {
        let path = socket_path();
        let listener = UnixListener::bind(&path).expect("bind fake daemon socket");
        let handler: Arc<Handler> = Arc::new(handler);
        let connections = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let accept_task = tokio::spawn({
            let connections = connections.clone();
            let requests = requests.clone();
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let delay = match connections.fetch_add(1, Ordering::SeqCst) {
                        0 => first_read_delay,
                        _ => None,
                    };
                    tokio::spawn(serve(stream, delay, handler.clone(), requests.clone()));
                }
            }
        });

        Self {
            path,
            accept_task,
            connections,
            requests,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        self.accept_task.abort();
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Socket path in the temp dir that nobody listens on
pub fn socket_path() -> PathBuf {
    std::env::temp_dir().join(format!("lightning-rpc-{}.sock", uuid::Uuid::new_v4()))
}

pub fn result(request: &Request, result: Value) -> DaemonReply {
    DaemonReply::Json(json!({"jsonrpc": "2.0", "id": request.id, "result": result}))
}

pub fn error(request: &Request, code: i64, message: &str) -> DaemonReply {
    DaemonReply::Json(json!({
        "jsonrpc": "2.0",
        "id": request.id,
        "error": {"code": code, "message": message}
    }))
}

async fn serve(
    stream: UnixStream,
    read_delay: Option<Duration>,
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<Request>>>,
) {
    if let Some(pause) = read_delay {
        tokio::time::sleep(pause).await;
    }
    let (read_half, write_half) = stream.into_split();
    let writer = Arc::new(tokio::sync::Mutex::new(write_half));
    let mut lines = BufReader::new(read_half).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let request = match codec::decode_request(line.as_bytes()) {
            Ok(request) => request,
            Err(_) => break,
        };
        requests.lock().unwrap().push(request.clone());

        match handler(&request) {
            DaemonReply::Json(value) => write_json(&writer, &value).await,
            DaemonReply::Raw(bytes) => write_bytes(&writer, &bytes).await,
            DaemonReply::Delayed(pause, value) => {
                let writer = writer.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(pause).await;
                    write_json(&writer, &value).await;
                });
            }
            DaemonReply::Silence => {}
            DaemonReply::Truncated(bytes) => {
                write_bytes(&writer, &bytes).await;
                let _ = writer.lock().await.shutdown().await;
                break;
            }
            DaemonReply::Hangup => {
                let _ = writer.lock().await.shutdown().await;
                break;
            }
        }
    }
}

async fn write_json(writer: &tokio::sync::Mutex<OwnedWriteHalf>, value: &Value) {
    let mut bytes = value.to_string().into_bytes();
    bytes.push(b'\n');
    write_bytes(writer, &bytes).await;
}

async fn write_bytes(writer: &tokio::sync::Mutex<OwnedWriteHalf>, bytes: &[u8]) {
    let mut writer = writer.lock().await;
    let _ = writer.write_all(bytes).await;
    let _ = writer.flush().await;
}
