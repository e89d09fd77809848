// Response Domain Model

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::request::RequestId;
use crate::error::RpcError;

/// JSON-RPC error object returned by the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Exactly one of `result` or `error`
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Result(Value),
    Error(ErrorObject),
}

/// Decoded JSON-RPC response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: RequestId,
    pub payload: ResponsePayload,
}

impl Response {
    pub fn success(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            id: id.into(),
            payload: ResponsePayload::Result(result),
        }
    }

    pub fn error(id: impl Into<RequestId>, error: ErrorObject) -> Self {
        Self {
            id: id.into(),
            payload: ResponsePayload::Error(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }

    /// Result value, or the daemon's error object as `RpcError::Remote`
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.payload {
            ResponsePayload::Result(value) => Ok(value),
            ResponsePayload::Error(err) => Err(RpcError::Remote {
                code: err.code,
                message: err.message,
                data: err.data,
            }),
        }
    }

    /// Wire representation (`jsonrpc`, `id` and one of `result`/`error`)
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(
            "jsonrpc".to_string(),
            Value::String(super::request::JSONRPC_VERSION.to_string()),
        );
        map.insert(
            "id".to_string(),
            serde_json::to_value(&self.id).unwrap_or(Value::Null),
        );
        match &self.payload {
            ResponsePayload::Result(value) => {
                map.insert("result".to_string(), value.clone());
            }
            ResponsePayload::Error(err) => {
                map.insert(
                    "error".to_string(),
                    serde_json::to_value(err).unwrap_or(Value::Null),
                );
            }
        }
        Value::Object(map)
    }
}
