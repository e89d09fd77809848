// Port Layer - Interfaces for external dependencies

pub mod id_provider; // Monotonic request ids
pub mod observer;
pub mod time_provider;
pub mod transport;

// Re-exports
pub use id_provider::{IdProvider, SequentialIdProvider};
pub use observer::{CallCompleted, CallObserver, NoopObserver, RequestSent, TracingObserver};
pub use time_provider::{SystemTimeProvider, TimeProvider};
pub use transport::{Connection, Connector, FrameReader, FrameWriter, TransportError};
