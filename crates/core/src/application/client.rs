//! RPC Client
//!
//! Orchestrates transport, codec and correlator behind a single
//! `call(method, params)` operation. Connection lifetime comes from
//! `ClientConfig::policy`:
//!
//! - `PerCall`: dial, send, await the matching response, close
//! - `Persistent`: one shared socket, many calls in flight, matched by id
//!
//! Nothing is retried here. Payment and channel methods are not idempotent,
//! so retry policy belongs to the caller.

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::codec;
use super::correlator::Correlator;
use super::session::Session;
use crate::config::{ClientConfig, ConnectionPolicy};
use crate::domain::{CallState, MatchOutcome, Params, Request, RequestId, Response};
use crate::error::{Result, RpcError};
use crate::port::{
    CallCompleted, CallObserver, Connection, Connector, IdProvider, NoopObserver, RequestSent,
    SequentialIdProvider, SystemTimeProvider, TimeProvider,
};

/// JSON-RPC 2.0 client for a local daemon
///
/// # Example
///
/// ```ignore
/// let client = RpcClient::new(Arc::new(UnixConnector::new("/tmp/lightning-rpc")), ClientConfig::per_call());
/// let info: serde_json::Value = client.call("getinfo", Params::empty_named()).await?;
/// ```
pub struct RpcClient {
    connector: Arc<dyn Connector>,
    config: ClientConfig,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    observer: Arc<dyn CallObserver>,
    session: Mutex<Option<Arc<Session>>>,
}

impl RpcClient {
    pub fn new(connector: Arc<dyn Connector>, config: ClientConfig) -> Self {
        Self::builder(connector).config(config).build()
    }

    pub fn builder(connector: Arc<dyn Connector>) -> RpcClientBuilder {
        RpcClientBuilder {
            connector,
            config: ClientConfig::default(),
            id_provider: Arc::new(SequentialIdProvider::new()),
            time_provider: Arc::new(SystemTimeProvider),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoint(&self) -> String {
        self.connector.endpoint()
    }

    /// Call `method` and deserialize its result into `R`
    ///
    /// # Errors
    /// - RpcError::Connect: socket unreachable or refused
    /// - RpcError::Io: write/read failure mid-call
    /// - RpcError::Remote: daemon returned a JSON-RPC error object
    /// - RpcError::MalformedResponse / UnknownId: protocol violation
    /// - RpcError::Timeout: deadline from `ClientConfig::request_timeout` passed
    /// - RpcError::ConnectionLost: connection closed before the response arrived
    pub async fn call<R: DeserializeOwned>(&self, method: &str, params: Params) -> Result<R> {
        let value = self.call_raw(method, params).await?;
        codec::decode_result(method, value)
    }

    /// Call `method` and return the raw result value
    pub async fn call_raw(&self, method: &str, params: Params) -> Result<Value> {
        let id = RequestId::Number(self.id_provider.next_id());
        let request = Request::new(id, method, params);
        let frame = codec::encode_request(&request)?;

        let started = Instant::now();
        let mut state = CallState::Idle;

        let exchange = self.exchange(&request, &frame, &mut state);
        let outcome = match self.config.request_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, exchange).await {
                Ok(outcome) => outcome,
                Err(_) => Err(RpcError::Timeout(deadline)),
            },
            None => exchange.await,
        };

        let final_state = settle(state, &outcome);
        let result = outcome.and_then(Response::into_result);

        self.observer.on_response_received(&CallCompleted {
            id: &request.id,
            method,
            state: final_state,
            elapsed: started.elapsed(),
            error: result.as_ref().err(),
        });

        result
    }

    /// Close the persistent connection, if one is open
    ///
    /// Calls still waiting on it resolve with `ConnectionLost`. The next call
    /// reconnects. No-op under `PerCall`.
    pub async fn shutdown(&self) {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            session.close().await;
        }
    }

    async fn exchange(
        &self,
        request: &Request,
        frame: &[u8],
        state: &mut CallState,
    ) -> Result<Response> {
        match self.config.policy {
            ConnectionPolicy::PerCall => self.exchange_per_call(request, frame, state).await,
            ConnectionPolicy::Persistent => self.exchange_persistent(request, frame, state).await,
        }
    }

    async fn exchange_per_call(
        &self,
        request: &Request,
        frame: &[u8],
        state: &mut CallState,
    ) -> Result<Response> {
        let Connection {
            mut reader,
            mut writer,
        } = self.connector.open().await?;

        let correlator = Correlator::new(self.time_provider.clone());
        let handle = correlator.register(request.id.clone(), &request.method)?;

        let outcome: Result<Response> = async {
            writer.write_frame(frame).await?;
            *state = state.send()?;
            self.notify_sent(request);

            let bytes = reader.read_frame().await?;
            let response = codec::decode_response(&bytes)?;
            if let Err(e) = correlator.resolve(response) {
                self.observer.on_protocol_violation(&e);
                return Err(e);
            }
            handle.wait().await
        }
        .await;

        writer.close().await;
        outcome
    }

    async fn exchange_persistent(
        &self,
        request: &Request,
        frame: &[u8],
        state: &mut CallState,
    ) -> Result<Response> {
        let session = self.live_session().await?;
        let handle = session
            .correlator()
            .register(request.id.clone(), &request.method)?;

        if let Err(e) = session.write(frame).await {
            warn!(id = %request.id, method = %request.method, error = %e, "Write failed, dropping connection");
            self.discard_session(&session).await;
            return Err(e);
        }
        *state = state.send()?;
        self.notify_sent(request);

        handle.wait().await
    }

    /// Current session, reconnecting if the previous one died
    async fn live_session(&self) -> Result<Arc<Session>> {
        let mut slot = self.session.lock().await;
        if let Some(session) = slot.as_ref() {
            if session.is_alive() {
                return Ok(Arc::clone(session));
            }
            debug!(endpoint = %self.connector.endpoint(), "Previous connection is gone, reconnecting");
        }

        let session = Session::open(
            self.connector.as_ref(),
            self.time_provider.clone(),
            self.observer.clone(),
        )
        .await?;
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    async fn discard_session(&self, session: &Arc<Session>) {
        {
            let mut slot = self.session.lock().await;
            if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, session)) {
                slot.take();
            }
        }
        session.close().await;
    }

    fn notify_sent(&self, request: &Request) {
        self.observer.on_request_sent(&RequestSent {
            id: &request.id,
            method: &request.method,
            params: &request.params,
        });
    }
}

/// Terminal state for a finished exchange
///
/// Every failure other than a timeout lands in `ConnectionLost`, protocol
/// violations included; the error itself travels on `CallCompleted::error`.
fn settle(state: CallState, outcome: &Result<Response>) -> CallState {
    let next = match outcome {
        Ok(response) if response.is_error() => state.matched(MatchOutcome::Error),
        Ok(_) => state.matched(MatchOutcome::Success),
        Err(RpcError::Timeout(_)) => state.time_out(),
        Err(_) => state.lose_connection(),
    };
    next.unwrap_or_else(|e| {
        warn!(error = %e, "Unexpected call state transition");
        state
    })
}

/// Builder for `RpcClient`
pub struct RpcClientBuilder {
    connector: Arc<dyn Connector>,
    config: ClientConfig,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    observer: Arc<dyn CallObserver>,
}

impl RpcClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn CallObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn id_provider(mut self, id_provider: Arc<dyn IdProvider>) -> Self {
        self.id_provider = id_provider;
        self
    }

    pub fn time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    pub fn build(self) -> RpcClient {
        RpcClient {
            connector: self.connector,
            config: self.config,
            id_provider: self.id_provider,
            time_provider: self.time_provider,
            observer: self.observer,
            session: Mutex::new(None),
        }
    }
}
