// Lightning RPC Infrastructure - Unix Socket Transport
// Implements: Connector, FrameReader, FrameWriter

pub mod unix_connector;

pub use unix_connector::{UnixConnector, UnixFrameReader, UnixFrameWriter};
