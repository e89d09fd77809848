//! SDK Error Types

use serde_json::Value;
use thiserror::Error;

use crate::catalog::Method;
use lightning_rpc_core::RpcError;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK Error, always tagged with the daemon method that failed
#[derive(Debug, Error)]
pub enum SdkError {
    /// The daemon answered with a JSON-RPC error object
    #[error("error calling {method}: {message} (code {code})")]
    Rpc {
        method: Method,
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// Anything else: transport, protocol, timeout, local encoding
    #[error("error calling {method}: {source}")]
    Call {
        method: Method,
        #[source]
        source: RpcError,
    },
}

impl SdkError {
    pub fn method(&self) -> Method {
        match self {
            SdkError::Rpc { method, .. } | SdkError::Call { method, .. } => *method,
        }
    }

    /// Daemon error code, if the daemon rejected the call
    pub fn code(&self) -> Option<i64> {
        match self {
            SdkError::Rpc { code, .. } => Some(*code),
            SdkError::Call { .. } => None,
        }
    }
}

impl From<(Method, RpcError)> for SdkError {
    fn from((method, err): (Method, RpcError)) -> Self {
        match err {
            RpcError::Remote {
                code,
                message,
                data,
            } => SdkError::Rpc {
                method,
                code,
                message,
                data,
            },
            source => SdkError::Call { method, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_becomes_rpc() {
        let err = SdkError::from((
            Method::GetRoute,
            RpcError::Remote {
                code: -1,
                message: "no route found".to_string(),
                data: None,
            },
        ));

        assert_eq!(err.code(), Some(-1));
        assert_eq!(err.method(), Method::GetRoute);
        assert_eq!(
            err.to_string(),
            "error calling getroute: no route found (code -1)"
        );
    }

    #[test]
    fn test_other_errors_keep_source() {
        let err = SdkError::from((Method::Stop, RpcError::ConnectionLost));

        assert!(err.code().is_none());
        assert!(matches!(
            err,
            SdkError::Call {
                source: RpcError::ConnectionLost,
                ..
            }
        ));
    }
}
