// Request Domain Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// JSON-RPC protocol version tag carried by every request
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier
///
/// Ids issued by this client are always numbers; strings are accepted
/// because daemons may echo whatever they were given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(u64),
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<u64> for RequestId {
    fn from(n: u64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

/// Parameter encoding style expected by a daemon method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    Positional,
    Named,
}

impl fmt::Display for ParamStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamStyle::Positional => write!(f, "POSITIONAL"),
            ParamStyle::Named => write!(f, "NAMED"),
        }
    }
}

/// Method parameters, either an ordered list or a name -> value mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Params {
    /// Ordered parameters from anything that yields JSON values
    pub fn positional<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Named parameters from a serializable struct or map
    ///
    /// Fails if `value` does not serialize to a JSON object.
    pub fn named<T: Serialize>(value: &T) -> crate::error::Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Params::Named(map)),
            other => Err(crate::error::RpcError::InvalidParams(format!(
                "named params must serialize to an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// `[]`
    pub fn empty_positional() -> Self {
        Params::Positional(Vec::new())
    }

    /// `{}`
    pub fn empty_named() -> Self {
        Params::Named(Map::new())
    }

    pub fn style(&self) -> ParamStyle {
        match self {
            Params::Positional(_) => ParamStyle::Positional,
            Params::Named(_) => ParamStyle::Named,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Params {
    fn default() -> Self {
        Params::empty_named()
    }
}

/// JSON-RPC 2.0 request object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    pub params: Params,
}

impl Request {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Params) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
