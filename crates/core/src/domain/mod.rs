// Domain Layer - JSON-RPC wire entities and per-call lifecycle

pub mod call;
pub mod error;
pub mod request;
pub mod response;

// Re-exports
pub use call::{CallState, MatchOutcome};
pub use error::DomainError;
pub use request::{ParamStyle, Params, Request, RequestId, JSONRPC_VERSION};
pub use response::{ErrorObject, Response, ResponsePayload};
