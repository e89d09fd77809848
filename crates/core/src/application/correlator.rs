// Response Correlator
// Matches incoming responses to outstanding calls by request id

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::{RequestId, Response};
use crate::error::{Result, RpcError};
use crate::port::TimeProvider;

/// An outstanding call waiting for its response
#[derive(Debug)]
pub struct PendingCall {
    pub id: RequestId,
    pub method: String,
    /// Epoch ms when the call was registered
    pub issued_at: i64,
    result_channel: oneshot::Sender<Result<Response>>,
}

/// What `resolve` did with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Handed to the waiting caller
    Delivered,
    /// Caller gave up earlier; response consumed as a no-op
    Abandoned,
}

/// How long an abandoned id keeps accepting its late response
pub const ABANDONED_RETENTION_MS: i64 = 5 * 60 * 1000;

/// Most abandoned ids remembered per connection; the oldest go first
pub const MAX_ABANDONED: usize = 1024;

#[derive(Default)]
struct CorrelatorState {
    pending: HashMap<RequestId, PendingCall>,
    /// Abandoned id -> epoch ms when its caller gave up
    abandoned: HashMap<RequestId, i64>,
    closed: bool,
}

impl CorrelatorState {
    fn abandon(&mut self, id: RequestId, now: i64) {
        self.abandoned.insert(id, now);
        while self.abandoned.len() > MAX_ABANDONED {
            let Some(oldest) = self
                .abandoned
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            self.abandoned.remove(&oldest);
        }
    }

    fn prune_abandoned(&mut self, now: i64) {
        let before = self.abandoned.len();
        self.abandoned.retain(|_, at| now - *at < ABANDONED_RETENTION_MS);
        let pruned = before - self.abandoned.len();
        if pruned > 0 {
            debug!(pruned, "Forgot abandoned calls past retention");
        }
    }
}

/// Pending-call table for one connection
///
/// Cheap to clone; clones share the same table.
#[derive(Clone)]
pub struct Correlator {
    state: Arc<Mutex<CorrelatorState>>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Correlator {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CorrelatorState::default())),
            time_provider,
        }
    }

    /// Start tracking a call and hand back its wait-handle
    ///
    /// # Errors
    /// - RpcError::DuplicateId if `id` is already outstanding
    /// - RpcError::ConnectionLost if the connection was already torn down
    pub fn register(&self, id: RequestId, method: &str) -> Result<WaitHandle> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(RpcError::ConnectionLost);
        }
        if state.pending.contains_key(&id) {
            return Err(RpcError::DuplicateId(id));
        }
        let now = self.time_provider.now_millis();
        state.prune_abandoned(now);
        // A reused id could otherwise swallow a late reply meant for the old call
        state.abandoned.remove(&id);

        let (tx, rx) = oneshot::channel();
        state.pending.insert(
            id.clone(),
            PendingCall {
                id: id.clone(),
                method: method.to_string(),
                issued_at: now,
                result_channel: tx,
            },
        );
        debug!(id = %id, method = %method, pending = state.pending.len(), "Registered pending call");

        Ok(WaitHandle {
            id,
            rx,
            state: Arc::clone(&self.state),
            time_provider: Arc::clone(&self.time_provider),
            settled: false,
        })
    }

    /// Route a response to the call that issued it
    ///
    /// # Errors
    /// RpcError::UnknownId when no outstanding or abandoned call carries the
    /// response's id, including a second response for an already resolved id.
    /// Other pending calls are left untouched.
    pub fn resolve(&self, response: Response) -> Result<Resolution> {
        let mut state = lock(&self.state);

        if let Some(call) = state.pending.remove(&response.id) {
            let age_ms = self.time_provider.now_millis() - call.issued_at;
            debug!(id = %call.id, method = %call.method, age_ms, "Resolved pending call");
            // Receiver gone means the handle is mid-drop; treat like abandonment
            return Ok(match call.result_channel.send(Ok(response)) {
                Ok(()) => Resolution::Delivered,
                Err(_) => Resolution::Abandoned,
            });
        }

        if state.abandoned.remove(&response.id).is_some() {
            debug!(id = %response.id, "Late response for abandoned call");
            return Ok(Resolution::Abandoned);
        }

        warn!(id = %response.id, "Response matches no outstanding call");
        Err(RpcError::UnknownId(response.id))
    }

    /// Fail one call with `error` instead of a response
    ///
    /// Used when a frame names a call but is not a valid response. The
    /// connection and every other pending call are left as they are.
    ///
    /// # Errors
    /// RpcError::UnknownId when no outstanding or abandoned call carries `id`
    pub fn reject(&self, id: &RequestId, error: RpcError) -> Result<Resolution> {
        let mut state = lock(&self.state);

        if let Some(call) = state.pending.remove(id) {
            debug!(id = %call.id, method = %call.method, error = %error, "Rejected pending call");
            return Ok(match call.result_channel.send(Err(error)) {
                Ok(()) => Resolution::Delivered,
                Err(_) => Resolution::Abandoned,
            });
        }

        if state.abandoned.remove(id).is_some() {
            debug!(id = %id, "Bad late response for abandoned call");
            return Ok(Resolution::Abandoned);
        }

        Err(RpcError::UnknownId(id.clone()))
    }

    /// Fail every outstanding call with `ConnectionLost` and refuse new ones
    ///
    /// Returns the number of calls that were failed.
    pub fn fail_all(&self) -> usize {
        let mut state = lock(&self.state);
        state.closed = true;
        state.abandoned.clear();

        let calls: Vec<PendingCall> = state.pending.drain().map(|(_, call)| call).collect();
        let failed = calls.len();
        for call in calls {
            debug!(id = %call.id, method = %call.method, "Failing pending call: connection lost");
            let _ = call.result_channel.send(Err(RpcError::ConnectionLost));
        }
        failed
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.state).pending.len()
    }

    /// Abandoned ids still waiting for a late response
    pub fn abandoned_count(&self) -> usize {
        lock(&self.state).abandoned.len()
    }

    /// Sorted ids of outstanding calls (diagnostics)
    pub fn pending_ids(&self) -> Vec<RequestId> {
        let state = lock(&self.state);
        let mut ids: Vec<RequestId> = state.pending.keys().cloned().collect();
        ids.sort_by_key(|id| id.to_string());
        ids
    }

    /// `issued_at` of an outstanding call
    pub fn issued_at(&self, id: &RequestId) -> Option<i64> {
        lock(&self.state).pending.get(id).map(|call| call.issued_at)
    }
}

/// Caller-side token for one in-flight call, resolved exactly once
///
/// Dropping it before resolution abandons the call: its eventual response is
/// accepted by the correlator as a no-op instead of an unknown id.
pub struct WaitHandle {
    id: RequestId,
    rx: oneshot::Receiver<Result<Response>>,
    state: Arc<Mutex<CorrelatorState>>,
    time_provider: Arc<dyn TimeProvider>,
    settled: bool,
}

impl WaitHandle {
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Wait for the matching response
    ///
    /// # Errors
    /// RpcError::ConnectionLost if the connection died first
    pub async fn wait(mut self) -> Result<Response> {
        let outcome = (&mut self.rx).await;
        self.settled = true;
        match outcome {
            Ok(result) => result,
            Err(_) => Err(RpcError::ConnectionLost),
        }
    }
}

impl Drop for WaitHandle {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = lock(&self.state);
        if state.pending.remove(&self.id).is_some() && !state.closed {
            debug!(id = %self.id, "Call abandoned by caller");
            state.abandon(self.id.clone(), self.time_provider.now_millis());
        }
    }
}

fn lock(state: &Mutex<CorrelatorState>) -> MutexGuard<'_, CorrelatorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorObject;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use serde_json::json;
    use std::time::Duration;

    fn correlator() -> (Correlator, Arc<FixedTimeProvider>) {
        let clock = Arc::new(FixedTimeProvider::new(1_000));
        (Correlator::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_resolve_delivers_to_waiter() {
        let (correlator, _) = correlator();
        let handle = correlator.register(RequestId::Number(1), "getinfo").unwrap();

        let resolution = correlator
            .resolve(Response::success(1, json!({"port": 9735})))
            .unwrap();
        assert_eq!(resolution, Resolution::Delivered);
        assert_eq!(correlator.pending_count(), 0);

        let response = handle.wait().await.unwrap();
        assert_eq!(response.into_result().unwrap()["port"], json!(9735));
    }

    #[tokio::test]
    async fn test_unknown_id_leaves_other_calls_alone() {
        let (correlator, _) = correlator();
        let first = correlator.register(RequestId::Number(1), "getinfo").unwrap();
        let _second = correlator.register(RequestId::Number(2), "getpeers").unwrap();

        let err = correlator
            .resolve(Response::success(99, json!(null)))
            .unwrap_err();
        assert!(matches!(err, RpcError::UnknownId(RequestId::Number(99))));
        assert_eq!(
            correlator.pending_ids(),
            vec![RequestId::Number(1), RequestId::Number(2)]
        );

        correlator
            .resolve(Response::error(1, ErrorObject::new(-1, "boom")))
            .unwrap();
        let response = first.wait().await.unwrap();
        assert!(response.is_error());
    }

    #[tokio::test]
    async fn test_second_response_for_same_id_is_rejected() {
        let (correlator, _) = correlator();
        let handle = correlator.register(RequestId::Number(5), "invoice").unwrap();

        correlator
            .resolve(Response::success(5, json!({"rhash": "aa"})))
            .unwrap();
        let err = correlator
            .resolve(Response::success(5, json!({"rhash": "bb"})))
            .unwrap_err();
        assert!(matches!(err, RpcError::UnknownId(_)));

        // The caller sees the first response only
        let response = handle.wait().await.unwrap();
        assert_eq!(response.into_result().unwrap()["rhash"], json!("aa"));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let (correlator, _) = correlator();
        let _handle = correlator.register(RequestId::Number(1), "getinfo").unwrap();

        let err = correlator
            .register(RequestId::Number(1), "getinfo")
            .err()
            .unwrap();
        assert!(matches!(err, RpcError::DuplicateId(_)));
    }

    #[test]
    fn test_abandoned_call_accepts_late_response_once() {
        let (correlator, _) = correlator();
        let handle = correlator.register(RequestId::Number(3), "sendpay").unwrap();
        drop(handle);
        assert_eq!(correlator.pending_count(), 0);

        assert_eq!(
            correlator
                .resolve(Response::success(3, json!({"preimage": "00"})))
                .unwrap(),
            Resolution::Abandoned
        );
        assert!(matches!(
            correlator.resolve(Response::success(3, json!(null))),
            Err(RpcError::UnknownId(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_all_resolves_every_waiter_with_connection_lost() {
        let (correlator, _) = correlator();
        let handles: Vec<WaitHandle> = (1..=3)
            .map(|i| correlator.register(RequestId::Number(i), "getnodes").unwrap())
            .collect();

        assert_eq!(correlator.fail_all(), 3);
        assert!(correlator.is_closed());

        for handle in handles {
            let result = tokio::time::timeout(Duration::from_secs(1), handle.wait())
                .await
                .expect("wait-handle hung after fail_all");
            assert!(matches!(result, Err(RpcError::ConnectionLost)));
        }

        assert!(matches!(
            correlator.register(RequestId::Number(4), "getnodes"),
            Err(RpcError::ConnectionLost)
        ));
    }

    #[test]
    fn test_issued_at_comes_from_time_provider() {
        let (correlator, clock) = correlator();
        let _a = correlator.register(RequestId::Number(1), "getinfo").unwrap();
        clock.advance(250);
        let _b = correlator.register(RequestId::Number(2), "getinfo").unwrap();

        assert_eq!(correlator.issued_at(&RequestId::Number(1)), Some(1_000));
        assert_eq!(correlator.issued_at(&RequestId::Number(2)), Some(1_250));
    }

    #[test]
    fn test_abandoned_ids_expire_after_retention() {
        let (correlator, clock) = correlator();
        drop(correlator.register(RequestId::Number(1), "sendpay").unwrap());
        assert_eq!(correlator.abandoned_count(), 1);

        clock.advance(ABANDONED_RETENTION_MS);
        let _next = correlator.register(RequestId::Number(2), "getinfo").unwrap();

        assert_eq!(correlator.abandoned_count(), 0);
        assert!(matches!(
            correlator.resolve(Response::success(1, json!(null))),
            Err(RpcError::UnknownId(_))
        ));
    }

    #[test]
    fn test_abandoned_ids_capped_oldest_first() {
        let (correlator, clock) = correlator();
        let total = MAX_ABANDONED as u64 + 10;
        for i in 1..=total {
            drop(correlator.register(RequestId::Number(i), "getroute").unwrap());
            clock.advance(1);
        }

        assert_eq!(correlator.abandoned_count(), MAX_ABANDONED);
        assert!(matches!(
            correlator.resolve(Response::success(1, json!(null))),
            Err(RpcError::UnknownId(_))
        ));
        assert_eq!(
            correlator
                .resolve(Response::success(total, json!(null)))
                .unwrap(),
            Resolution::Abandoned
        );
    }

    #[tokio::test]
    async fn test_reject_fails_only_the_named_call() {
        let (correlator, _) = correlator();
        let bad = correlator.register(RequestId::Number(1), "getinfo").unwrap();
        let good = correlator.register(RequestId::Number(2), "getpeers").unwrap();

        let resolution = correlator
            .reject(
                &RequestId::Number(1),
                RpcError::MalformedResponse("response 1 carries neither result nor error".into()),
            )
            .unwrap();
        assert_eq!(resolution, Resolution::Delivered);
        assert!(matches!(bad.wait().await, Err(RpcError::MalformedResponse(_))));

        assert!(!correlator.is_closed());
        assert_eq!(correlator.pending_ids(), vec![RequestId::Number(2)]);
        correlator
            .resolve(Response::success(2, json!({"peers": []})))
            .unwrap();
        tokio_test::assert_ok!(good.wait().await);

        assert!(matches!(
            correlator.reject(&RequestId::Number(9), RpcError::MalformedResponse("x".into())),
            Err(RpcError::UnknownId(RequestId::Number(9)))
        ));
    }
}
