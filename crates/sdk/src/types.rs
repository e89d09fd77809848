//! SDK Response Types
//!
//! Field names follow the daemon's JSON. Unknown fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// Result of methods that return nothing useful
///
/// Accepts any value (`null`, `{}`, `true`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Empty;

impl<'de> Deserialize<'de> for Empty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAddressResponse {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetInfoResponse {
    pub id: String,
    pub port: u32,
    pub testnet: bool,
    pub version: String,
    pub blockheight: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Peer {
    pub state: String,
    pub peerid: String,
    pub connected: bool,
    pub our_amount: i64,
    pub their_amount: i64,
    pub our_fee: i64,
    pub their_fee: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetPeersResponse {
    #[serde(default)]
    pub peers: Vec<Peer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub from: String,
    pub to: String,
    pub base_fee: u64,
    pub proportional_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetChannelsResponse {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// One hop of a payment route
///
/// Serializable because `sendpay` takes the route back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    #[serde(rename = "id")]
    pub node_id: String,
    /// Amount to forward at this hop (millisatoshi)
    pub msatoshi: u64,
    pub delay: u32,
    pub channel: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Route {
    #[serde(rename = "route", default)]
    pub hops: Vec<RouteHop>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendPaymentResponse {
    pub preimage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Node {
    #[serde(rename = "nodeid")]
    pub node_id: String,
    #[serde(default)]
    pub addresses: Vec<NodeAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetNodesResponse {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Invoice {
    #[serde(rename = "rhash")]
    pub payment_hash: String,
    #[serde(rename = "paymentKey")]
    pub payment_key: String,
}
