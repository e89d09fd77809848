// Call Observer Port
// Injectable hook fired around every call; the core installs no global logging state

use std::time::Duration;

use crate::domain::{CallState, Params, RequestId};
use crate::error::RpcError;

/// Fired after a request was written to the connection
#[derive(Debug)]
pub struct RequestSent<'a> {
    pub id: &'a RequestId,
    pub method: &'a str,
    pub params: &'a Params,
}

/// Fired once per call when it reaches a terminal state
#[derive(Debug)]
pub struct CallCompleted<'a> {
    pub id: &'a RequestId,
    pub method: &'a str,
    /// `ConnectionLost` also covers calls that failed on a protocol violation
    /// (malformed response, unknown id) or a connect/IO error; `error` tells
    /// them apart
    pub state: CallState,
    pub elapsed: Duration,
    /// Set for every outcome except `Matched(Success)`
    pub error: Option<&'a RpcError>,
}

/// Observer of request/response events
///
/// Both hooks run inline on the calling task and must not block.
pub trait CallObserver: Send + Sync {
    fn on_request_sent(&self, _event: &RequestSent<'_>) {}

    fn on_response_received(&self, _event: &CallCompleted<'_>) {}

    /// The daemon sent something that cannot be matched or decoded
    fn on_protocol_violation(&self, _error: &RpcError) {}
}

/// Observer that ignores everything (default)
pub struct NoopObserver;

impl CallObserver for NoopObserver {}

/// Observer that reports calls as `tracing` debug events
pub struct TracingObserver;

impl CallObserver for TracingObserver {
    fn on_request_sent(&self, event: &RequestSent<'_>) {
        tracing::debug!(
            id = %event.id,
            method = %event.method,
            params = ?event.params,
            "Calling lightning.{}",
            event.method
        );
    }

    fn on_response_received(&self, event: &CallCompleted<'_>) {
        match event.error {
            None => tracing::debug!(
                id = %event.id,
                method = %event.method,
                elapsed_ms = event.elapsed.as_millis() as u64,
                "method {} returned",
                event.method
            ),
            Some(err) => tracing::debug!(
                id = %event.id,
                method = %event.method,
                state = %event.state,
                elapsed_ms = event.elapsed.as_millis() as u64,
                error = %err,
                "error calling {}",
                event.method
            ),
        }
    }

    fn on_protocol_violation(&self, error: &RpcError) {
        tracing::warn!(error = %error, "Protocol violation from daemon");
    }
}

pub mod mocks {
    use super::*;
    use std::sync::{Mutex, PoisonError};

    /// One recorded observer event
    #[derive(Debug, Clone, PartialEq)]
    pub enum ObservedEvent {
        Sent { id: RequestId, method: String },
        Completed { id: RequestId, method: String, state: CallState },
        Violation { message: String },
    }

    /// Observer that records every event for assertions
    #[derive(Default)]
    pub struct RecordingObserver {
        events: Mutex<Vec<ObservedEvent>>,
    }

    impl RecordingObserver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<ObservedEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        fn push(&self, event: ObservedEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }

    impl CallObserver for RecordingObserver {
        fn on_request_sent(&self, event: &RequestSent<'_>) {
            self.push(ObservedEvent::Sent {
                id: event.id.clone(),
                method: event.method.to_string(),
            });
        }

        fn on_response_received(&self, event: &CallCompleted<'_>) {
            self.push(ObservedEvent::Completed {
                id: event.id.clone(),
                method: event.method.to_string(),
                state: event.state,
            });
        }

        fn on_protocol_violation(&self, error: &RpcError) {
            self.push(ObservedEvent::Violation {
                message: error.to_string(),
            });
        }
    }
}
