//! Client Configuration
//!
//! Connection lifetime is always chosen explicitly here; the client never
//! picks one behind the caller's back.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables (no magic values)
pub mod constants {
    use std::time::Duration;

    /// Default per-call deadline (30s)
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Largest single JSON value accepted from the daemon (16 MiB)
    pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

    /// Socket read chunk size (8 KiB)
    pub const READ_CHUNK_BYTES: usize = 8 * 1024;

    /// Default daemon socket location
    pub const DEFAULT_SOCKET_PATH: &str = "~/.lightning/lightning-rpc";
}

/// Connection lifetime policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPolicy {
    /// Dial, send one request, read one response, close
    PerCall,
    /// Keep one socket open and multiplex calls over it by id
    Persistent,
}

/// RPC Client Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub policy: ConnectionPolicy,

    /// Deadline per call in milliseconds; `None` waits forever
    #[serde(rename = "request_timeout_ms", with = "millis")]
    pub request_timeout: Option<Duration>,

    pub max_frame_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            policy: ConnectionPolicy::PerCall,
            request_timeout: Some(constants::DEFAULT_REQUEST_TIMEOUT),
            max_frame_bytes: constants::DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl ClientConfig {
    pub fn per_call() -> Self {
        Self::default()
    }

    pub fn persistent() -> Self {
        Self {
            policy: ConnectionPolicy::Persistent,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.request_timeout = None;
        self
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
