// Application Layer - Codec, Correlation and the RPC client

pub mod client;
pub mod codec;
pub mod correlator;
pub mod framing;
mod session;

// Re-exports
pub use client::{RpcClient, RpcClientBuilder};
pub use correlator::{Correlator, PendingCall, Resolution, WaitHandle};
pub use framing::FrameDecoder;
