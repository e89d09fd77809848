//! Lightning RPC SDK - typed client for the daemon's JSON-RPC socket
//!
//! # Example
//!
//! ```no_run
//! use lightning_rpc_sdk::LightningRpc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rpc = LightningRpc::new("~/.lightning/lightning-rpc");
//!
//!     let route = rpc.get_route("03cd..", 100_000, 1.0).await?;
//!     let paid = rpc.send_payment(&route.hops, "payment-hash").await?;
//!
//!     println!("preimage: {}", paid.preimage);
//!     Ok(())
//! }
//! ```

mod catalog;
mod client;
mod error;
mod types;

pub use catalog::Method;
pub use client::LightningRpc;
pub use error::{Result, SdkError};
pub use types::{
    Channel, Empty, GetChannelsResponse, GetInfoResponse, GetNodesResponse, GetPeersResponse,
    Invoice, NewAddressResponse, Node, NodeAddress, Peer, Route, RouteHop, SendPaymentResponse,
};

// Lower layers, for callers who need a custom connector or observer
pub use lightning_rpc_core::{ClientConfig, ConnectionPolicy, Params, RpcClient, RpcError};
pub use lightning_rpc_infra_unix::UnixConnector;
