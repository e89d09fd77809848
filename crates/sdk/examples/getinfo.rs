//! Node Info Example
//!
//! Prints the node's identity and known channels.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example getinfo -- ~/.lightning/lightning-rpc
//! ```

use lightning_rpc_sdk::LightningRpc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_SOCKET_PATH: &str = "~/.lightning/lightning-rpc";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=lightning_rpc_core=debug shows every call
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("lightning_rpc=info"))?;
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty())
        .init();

    let socket_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SOCKET_PATH.to_string());
    let rpc = LightningRpc::persistent(&socket_path);

    let info = rpc.get_info().await?;
    println!("Node {}", info.id);
    println!("  version:     {}", info.version);
    println!("  port:        {}", info.port);
    println!("  testnet:     {}", info.testnet);
    println!("  blockheight: {}", info.blockheight);

    let channels = rpc.get_channels().await?;
    println!("\n{} channel(s)", channels.channels.len());
    for channel in &channels.channels {
        println!(
            "  {} -> {} (base {} / prop {})",
            channel.from, channel.to, channel.base_fee, channel.proportional_fee
        );
    }

    rpc.shutdown().await;
    Ok(())
}
