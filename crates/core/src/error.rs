// Central Error Type for RPC calls

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::domain::RequestId;
use crate::port::TransportError;

/// Every way a call can fail, surfaced verbatim to the caller
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Connect error: {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RPC error ({code}): {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response id {0} matches no outstanding call")]
    UnknownId(RequestId),

    #[error("Request id {0} is already outstanding")]
    DuplicateId(RequestId),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection lost")]
    ConnectionLost,

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),
}

impl RpcError {
    /// Daemon answered with a JSON-RPC error object
    pub fn is_remote(&self) -> bool {
        matches!(self, RpcError::Remote { .. })
    }

    pub fn remote_code(&self) -> Option<i64> {
        match self {
            RpcError::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Daemon broke the JSON-RPC contract
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            RpcError::MalformedResponse(_) | RpcError::UnknownId(_)
        )
    }
}

impl From<TransportError> for RpcError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connect { endpoint, source } => RpcError::Connect { endpoint, source },
            TransportError::Io(e) => RpcError::Io(e),
            TransportError::Closed => RpcError::ConnectionLost,
            TransportError::FrameTooLarge { limit } => RpcError::MalformedResponse(format!(
                "frame exceeds {} bytes",
                limit
            )),
            TransportError::InvalidFrame(msg) => RpcError::MalformedResponse(msg),
        }
    }
}

/// Result type alias using RpcError
pub type Result<T> = std::result::Result<T, RpcError>;
