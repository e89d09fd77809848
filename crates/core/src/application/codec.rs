//! JSON-RPC 2.0 Codec
//!
//! Requests go out as `{"jsonrpc":"2.0","id":..,"method":..,"params":..}`
//! followed by `\n`. Responses are validated strictly enough that a reply
//! which cannot be correlated or interpreted never reaches the caller as
//! a value.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::request::json_kind;
use crate::domain::{ErrorObject, Request, RequestId, Response, ResponsePayload, JSONRPC_VERSION};
use crate::error::{Result, RpcError};

/// Serialize a request into one wire frame
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(request)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse a request frame (daemon side of the wire, used by fakes and echo checks)
pub fn decode_request(frame: &[u8]) -> Result<Request> {
    Ok(serde_json::from_slice(frame)?)
}

/// Serialize a response into one wire frame
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(&response.to_value())?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse and validate one response frame
///
/// # Errors
/// RpcError::MalformedResponse when the frame is not a JSON object, has no
/// usable `id`, carries both or neither of `result`/`error`, has an invalid
/// error object, or declares a `jsonrpc` version other than "2.0".
///
/// A missing `jsonrpc` member is accepted. `"error": null` next to a result
/// (and `"result": null` next to an error) is read as absent.
pub fn decode_response(frame: &[u8]) -> Result<Response> {
    let value: Value = serde_json::from_slice(frame)
        .map_err(|e| malformed(format!("invalid JSON: {}", e)))?;

    let mut map = match value {
        Value::Object(map) => map,
        other => {
            return Err(malformed(format!(
                "expected an object, got {}",
                json_kind(&other)
            )))
        }
    };

    if let Some(version) = map.get("jsonrpc") {
        if version.as_str() != Some(JSONRPC_VERSION) {
            return Err(malformed(format!("unsupported jsonrpc version {}", version)));
        }
    }

    let id = take_id(&mut map)?;

    let mut result = map.remove("result");
    let mut error = map.remove("error");
    if result.is_some() && matches!(error, Some(Value::Null)) {
        error = None;
    } else if error.is_some() && matches!(result, Some(Value::Null)) {
        result = None;
    }

    let payload = match (result, error) {
        (Some(result), None) => ResponsePayload::Result(result),
        (None, Some(error)) => {
            let error: ErrorObject = serde_json::from_value(error)
                .map_err(|e| malformed(format!("invalid error object for id {}: {}", id, e)))?;
            ResponsePayload::Error(error)
        }
        (Some(_), Some(_)) => {
            return Err(malformed(format!(
                "response {} carries both result and error",
                id
            )))
        }
        (None, None) => {
            return Err(malformed(format!(
                "response {} carries neither result nor error",
                id
            )))
        }
    };

    Ok(Response { id, payload })
}

/// Best-effort id of a frame that `decode_response` rejected
///
/// `None` when the frame is not an object or its `id` is missing or unusable,
/// in which case the frame cannot be tied to any call.
pub fn response_id(frame: &[u8]) -> Option<RequestId> {
    match serde_json::from_slice::<Value>(frame).ok()? {
        Value::Object(mut map) => take_id(&mut map).ok(),
        _ => None,
    }
}

/// Deserialize a result value into the caller's expected shape
pub fn decode_result<R: DeserializeOwned>(method: &str, value: Value) -> Result<R> {
    serde_json::from_value(value).map_err(|e| {
        malformed(format!(
            "result of {} does not match expected shape: {}",
            method, e
        ))
    })
}

fn take_id(map: &mut Map<String, Value>) -> Result<RequestId> {
    match map.remove("id") {
        None | Some(Value::Null) => Err(malformed("missing id".to_string())),
        Some(id) => serde_json::from_value(id.clone())
            .map_err(|_| malformed(format!("id must be an unsigned integer or string, got {}", id))),
    }
}

fn malformed(msg: String) -> RpcError {
    RpcError::MalformedResponse(msg)
}
