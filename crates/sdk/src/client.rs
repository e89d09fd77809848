//! Lightning Client Implementation

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::catalog::Method;
use crate::error::{Result, SdkError};
use crate::types::{
    Empty, GetChannelsResponse, GetInfoResponse, GetNodesResponse, GetPeersResponse, Invoice,
    NewAddressResponse, Route, RouteHop, SendPaymentResponse,
};
use lightning_rpc_core::port::TracingObserver;
use lightning_rpc_core::{ClientConfig, Params, RpcClient, RpcError};
use lightning_rpc_infra_unix::UnixConnector;

/// Lightning daemon client
///
/// # Example
///
/// ```no_run
/// use lightning_rpc_sdk::LightningRpc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rpc = LightningRpc::new("~/.lightning/lightning-rpc");
/// let info = rpc.get_info().await?;
/// println!("{} at block {}", info.id, info.blockheight);
/// # Ok(())
/// # }
/// ```
pub struct LightningRpc {
    client: RpcClient,
}

impl LightningRpc {
    /// Client that dials the socket for every call
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self::with_config(socket_path, ClientConfig::per_call())
    }

    /// Client that keeps one socket open and multiplexes calls over it
    pub fn persistent(socket_path: impl AsRef<Path>) -> Self {
        Self::with_config(socket_path, ClientConfig::persistent())
    }

    pub fn with_config(socket_path: impl AsRef<Path>, config: ClientConfig) -> Self {
        let connector = UnixConnector::new(socket_path).with_max_frame_bytes(config.max_frame_bytes);
        let client = RpcClient::builder(Arc::new(connector))
            .config(config)
            .observer(Arc::new(TracingObserver))
            .build();
        Self { client }
    }

    /// Wrap a preconfigured client (custom connector, observer or ids)
    pub fn with_client(client: RpcClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    /// Close the persistent connection, if any
    pub async fn shutdown(&self) {
        self.client.shutdown().await;
    }

    pub async fn new_address(&self) -> Result<NewAddressResponse> {
        self.call(Method::NewAddress, Method::NewAddress.no_params())
            .await
    }

    pub async fn get_info(&self) -> Result<GetInfoResponse> {
        self.call(Method::GetInfo, Method::GetInfo.no_params()).await
    }

    pub async fn get_peers(&self) -> Result<GetPeersResponse> {
        self.call(Method::GetPeers, Method::GetPeers.no_params()).await
    }

    pub async fn get_channels(&self) -> Result<GetChannelsResponse> {
        self.call(Method::GetChannels, Method::GetChannels.no_params())
            .await
    }

    /// Connect to a peer and fund a channel with `funding_tx_hex`
    pub async fn connect(&self, host: &str, port: u16, funding_tx_hex: &str) -> Result<()> {
        let params = Params::positional([json!(host), json!(port), json!(funding_tx_hex)]);
        self.call::<Empty>(Method::Connect, params).await?;
        Ok(())
    }

    pub async fn close(&self, peer_id: &str) -> Result<()> {
        let params = Params::positional([json!(peer_id)]);
        self.call::<Empty>(Method::Close, params).await?;
        Ok(())
    }

    /// Compute a route carrying `msatoshi` to `destination`
    pub async fn get_route(&self, destination: &str, msatoshi: u64, risk_factor: f32) -> Result<Route> {
        let params = Params::positional([json!(destination), json!(msatoshi), json!(risk_factor)]);
        self.call(Method::GetRoute, params).await
    }

    /// Pay along `route` (usually straight from `get_route`)
    pub async fn send_payment(&self, route: &[RouteHop], payment_hash: &str) -> Result<SendPaymentResponse> {
        let route = serde_json::to_value(route)
            .map_err(|e| SdkError::from((Method::SendPayment, RpcError::from(e))))?;
        let params = Params::positional([route, json!(payment_hash)]);
        self.call(Method::SendPayment, params).await
    }

    pub async fn get_nodes(&self) -> Result<GetNodesResponse> {
        self.call(Method::GetNodes, Method::GetNodes.no_params()).await
    }

    pub async fn invoice(&self, msatoshi: u64, label: &str) -> Result<Invoice> {
        let params = Params::positional([json!(msatoshi), json!(label)]);
        self.call(Method::Invoice, params).await
    }

    /// Ask the daemon to shut down
    pub async fn stop(&self) -> Result<()> {
        self.call::<Empty>(Method::Stop, Method::Stop.no_params())
            .await?;
        Ok(())
    }

    async fn call<R: DeserializeOwned>(&self, method: Method, params: Params) -> Result<R> {
        debug!(method = %method, params = params.len(), "Calling lightning.{}", method);
        self.client
            .call::<R>(method.wire_name(), params)
            .await
            .map_err(|e| {
                debug!(method = %method, error = %e, "error calling {}", method);
                SdkError::from((method, e))
            })
    }

    /// Escape hatch for methods not in the catalog
    pub async fn call_raw(&self, method: &str, params: Params) -> std::result::Result<Value, RpcError> {
        self.client.call_raw(method, params).await
    }
}
