// Lightning RPC Core - JSON-RPC 2.0 client logic & ports
// NO socket code here: transports plug in through port::Connector

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{RpcClient, RpcClientBuilder};
pub use config::{ClientConfig, ConnectionPolicy};
pub use domain::{ParamStyle, Params, RequestId};
pub use error::{Result, RpcError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
