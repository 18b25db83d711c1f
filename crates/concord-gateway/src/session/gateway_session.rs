//! Gateway session orchestrator
//!
//! Owns the socket, drives the read loop, and wires the inflater, frame
//! codec, heartbeat scheduler, dispatcher, and bootstrap worker together.
//! One connection means one read loop; all decoding and opcode branching
//! happens synchronously inside it to preserve frame-arrival order, while
//! handlers and reconciliation fan out as independent tasks.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use concord_common::{ClientConfig, ReconnectConfig};
use concord_core::{EntityCache, Snowflake};

use crate::bootstrap::{spawn_worker, BootstrapJob};
use crate::compression::StreamInflater;
use crate::dispatch::Dispatcher;
use crate::error::GatewayError;
use crate::events::{lifecycle, GatewayEventType, ReadyPayload, ReadySupplementalPayload};
use crate::heartbeat::{HeartbeatScheduler, LivenessSignal};
use crate::protocol::{
    ChannelRangesPayload, ClientProperties, ClientState, GatewayFrame, HelloData,
    IdentifyPayload, MemberRangesPayload, OpCode, PresencePayload, ResumePayload,
};
use crate::session::cache_events;
use crate::session::members::{member_ranges, MAX_RANGES_PER_REQUEST};
use crate::session::state::{SessionState, SessionStatus};

/// Outbound frame buffer per connection
const OUTBOUND_BUFFER: usize = 64;

/// How one physical connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionEnd {
    /// Explicit logout; the session is done
    Closed,
    /// Transport dropped or server asked to reconnect; resume if possible
    Resume,
    /// Session identity is gone; the next connection must identify afresh
    Reidentify,
}

/// Per-connection plumbing shared by the frame handlers
struct ConnectionCtx {
    outbound: mpsc::Sender<GatewayFrame>,
    liveness: mpsc::Sender<LivenessSignal>,
    heartbeat: Option<HeartbeatScheduler>,
    bootstrap: mpsc::Sender<BootstrapJob>,
}

/// Gateway session
///
/// Survives physical reconnects; session identity and sequence live on
/// [`SessionState`] so a dropped transport resumes instead of re-identifying.
pub struct GatewaySession {
    config: ClientConfig,
    state: Arc<SessionState>,
    dispatcher: Arc<Dispatcher>,
    cache: Arc<dyn EntityCache>,
    outbound: RwLock<Option<mpsc::Sender<GatewayFrame>>>,
    shutdown: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewaySession {
    /// Create a session against the shared entity cache
    pub fn new(config: ClientConfig, cache: Arc<dyn EntityCache>) -> Arc<Self> {
        let (shutdown, shutdown_rx) = watch::channel(false);
        Arc::new(Self {
            config,
            state: Arc::new(SessionState::new()),
            dispatcher: Arc::new(Dispatcher::new()),
            cache,
            outbound: RwLock::new(None),
            shutdown,
            shutdown_rx,
        })
    }

    /// Session state (status, sequence, latency)
    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// Last measured heartbeat round-trip latency
    pub fn latency(&self) -> Option<Duration> {
        self.state.latency()
    }

    /// Register a handler for a named event
    ///
    /// Wire events are dispatched under their wire names (`MESSAGE_CREATE`,
    /// ...); the session additionally emits the `session_*` lifecycle events.
    pub fn on<F, Fut>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.dispatcher.on(event, handler);
    }

    /// Send a frame over the current connection
    ///
    /// Returns `NotConnected` while no connection is up; sends never panic
    /// during teardown.
    pub async fn send(&self, frame: GatewayFrame) -> Result<(), GatewayError> {
        let sender = self.outbound.read().clone();
        match sender {
            Some(tx) => tx
                .send(frame)
                .await
                .map_err(|_| GatewayError::NotConnected),
            None => Err(GatewayError::NotConnected),
        }
    }

    /// Update the account's presence status
    pub async fn update_presence(&self, status: &str) -> Result<(), GatewayError> {
        let payload = PresencePayload::with_status(status);
        if !payload.is_valid_status() {
            return Err(GatewayError::Protocol(format!(
                "invalid presence status: {status}"
            )));
        }
        self.send(GatewayFrame::presence_update(&payload)).await
    }

    /// Request pages of guild members by numeric range
    ///
    /// Ranges are bounded to 100 members each and batched a few per frame;
    /// the opcode variant depends on the configured deployment. Returns the
    /// number of request frames sent.
    pub async fn request_members(
        &self,
        guild_id: Snowflake,
        channel_id: Snowflake,
        member_count: u64,
    ) -> Result<usize, GatewayError> {
        let ranges = member_ranges(member_count);
        let mut sent = 0;
        for batch in ranges.chunks(MAX_RANGES_PER_REQUEST) {
            let frame = if self.config.gateway.legacy_member_requests {
                GatewayFrame::request_members(&MemberRangesPayload {
                    guild_id,
                    ranges: batch.to_vec(),
                })
            } else {
                GatewayFrame::request_channel_members(&ChannelRangesPayload::single(
                    guild_id,
                    channel_id,
                    batch.to_vec(),
                ))
            };
            self.send(frame).await?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Request logout; `run` tears down and returns
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Drive the session until logout
    ///
    /// Reconnects on transport drops, liveness timeouts, and server-requested
    /// reconnects, resuming when session identity survives. Never propagates
    /// a connection error out; the session either self-heals or ends in
    /// `Disconnected` via `close`.
    pub async fn run(self: Arc<Self>) -> Result<(), GatewayError> {
        let mut failures: u32 = 0;
        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            match self.run_connection().await {
                Ok(ConnectionEnd::Closed) => break,
                Ok(end) => {
                    failures = 0;
                    self.dispatcher.dispatch(
                        lifecycle::SESSION_RECONNECTING,
                        json!({ "resume": end == ConnectionEnd::Resume }),
                    );
                }
                Err(error) => {
                    failures += 1;
                    tracing::warn!(%error, failures, "Connection attempt failed");
                    // A failed resume attempt stays Resuming; anything else
                    // rewinds so the next attempt starts from Disconnected
                    if self.state.status() != SessionStatus::Resuming {
                        let _ = self.state.transition(SessionStatus::Disconnected);
                    }
                }
            }

            let delay = reconnect_delay(&self.config.reconnect, failures);
            tracing::info!(delay_ms = delay.as_millis() as u64, "Reconnecting after delay");
            let mut shutdown_rx = self.shutdown_rx.clone();
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.changed() => break,
            }
        }

        // (_, Disconnected) is always a legal transition
        let _ = self.state.transition(SessionStatus::Disconnected);
        *self.outbound.write() = None;
        tracing::info!("Session disconnected");
        Ok(())
    }

    /// Run one physical connection to completion
    async fn run_connection(self: &Arc<Self>) -> Result<ConnectionEnd, GatewayError> {
        let resuming = self.state.status() == SessionStatus::Resuming;
        if !resuming {
            self.state.transition(SessionStatus::Connecting)?;
        }

        let base = if resuming {
            self.state
                .resume_url()
                .unwrap_or_else(|| self.config.gateway.url.clone())
        } else {
            self.config.gateway.url.clone()
        };
        let url = self.config.gateway.connect_url_from(&base);
        tracing::info!(%url, resuming, "Connecting to gateway");

        let (socket, _response) = connect_async(&url).await?;
        if !resuming {
            self.state.transition(SessionStatus::AwaitingHello)?;
        }
        self.state.reset_heartbeat();

        // One decompression context per physical connection, never reused
        let mut inflater = StreamInflater::new();
        let (mut ws_sink, mut ws_stream) = socket.split();

        let (tx, mut rx) = mpsc::channel::<GatewayFrame>(OUTBOUND_BUFFER);
        *self.outbound.write() = Some(tx.clone());

        let send_task = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                match frame.to_json() {
                    Ok(json) => {
                        if ws_sink.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%error, "Dropping unserializable frame");
                    }
                }
            }
            let _ = ws_sink.close().await;
        });

        let (liveness_tx, mut liveness_rx) = mpsc::channel::<LivenessSignal>(1);
        let mut ctx = ConnectionCtx {
            outbound: tx.clone(),
            liveness: liveness_tx,
            heartbeat: None,
            bootstrap: spawn_worker(self.cache.clone(), self.dispatcher.clone()),
        };
        let mut shutdown_rx = self.shutdown_rx.clone();

        let end = loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    tracing::info!("Logout requested");
                    break ConnectionEnd::Closed;
                }
                Some(LivenessSignal::AckMissed) = liveness_rx.recv() => {
                    // Zombied: close and resume so the sequence survives
                    tracing::warn!("Liveness timeout; closing connection");
                    break ConnectionEnd::Resume;
                }
                message = ws_stream.next() => {
                    match message {
                        Some(Ok(message)) => {
                            match self.handle_socket_message(message, &mut inflater, &mut ctx).await {
                                Ok(None) => {}
                                Ok(Some(end)) => break end,
                                Err(GatewayError::StreamCorrupt(reason)) => {
                                    // The shared context is desynchronized;
                                    // only a full reconnect recovers
                                    tracing::error!(%reason, "Compressed stream corrupted");
                                    break ConnectionEnd::Reidentify;
                                }
                                Err(error) => {
                                    tracing::warn!(%error, "Ignoring frame");
                                }
                            }
                        }
                        Some(Err(error)) => {
                            tracing::warn!(%error, "WebSocket error");
                            break ConnectionEnd::Resume;
                        }
                        None => {
                            tracing::info!("Gateway closed the connection");
                            break ConnectionEnd::Resume;
                        }
                    }
                }
            }
        };

        // Teardown in strict order: heartbeat, socket, inflater
        if let Some(heartbeat) = ctx.heartbeat.take() {
            heartbeat.stop();
        }
        *self.outbound.write() = None;
        drop(ctx);
        drop(tx);
        let _ = send_task.await;
        drop(inflater);

        Ok(self.settle_connection_end(end))
    }

    /// Normalize the connection end against the session state machine
    fn settle_connection_end(&self, end: ConnectionEnd) -> ConnectionEnd {
        match end {
            ConnectionEnd::Closed => ConnectionEnd::Closed,
            ConnectionEnd::Resume if self.state.can_resume() => {
                if self.state.status() == SessionStatus::Connected {
                    let _ = self.state.transition(SessionStatus::Resuming);
                }
                if self.state.status() == SessionStatus::Resuming {
                    ConnectionEnd::Resume
                } else {
                    let _ = self.state.transition(SessionStatus::Disconnected);
                    ConnectionEnd::Reidentify
                }
            }
            ConnectionEnd::Resume | ConnectionEnd::Reidentify => {
                self.state.clear_identity();
                if self.state.status() != SessionStatus::Invalidated {
                    let _ = self.state.transition(SessionStatus::Disconnected);
                }
                ConnectionEnd::Reidentify
            }
        }
    }

    /// Decode one WebSocket message into zero or more gateway documents
    async fn handle_socket_message(
        self: &Arc<Self>,
        message: Message,
        inflater: &mut StreamInflater,
        ctx: &mut ConnectionCtx,
    ) -> Result<Option<ConnectionEnd>, GatewayError> {
        match message {
            Message::Binary(bytes) => {
                for document in inflater.feed(&bytes)? {
                    if let Some(end) = self.handle_document(&document, ctx).await? {
                        return Ok(Some(end));
                    }
                }
                Ok(None)
            }
            Message::Text(text) => self.handle_document(text.as_bytes(), ctx).await,
            Message::Ping(_) | Message::Pong(_) => Ok(None),
            Message::Close(frame) => {
                tracing::info!(close = ?frame, "Close frame received");
                Ok(Some(ConnectionEnd::Resume))
            }
            Message::Frame(_) => Ok(None),
        }
    }

    /// Decode and branch one gateway document, in arrival order
    async fn handle_document(
        self: &Arc<Self>,
        bytes: &[u8],
        ctx: &mut ConnectionCtx,
    ) -> Result<Option<ConnectionEnd>, GatewayError> {
        let frame = match GatewayFrame::from_slice(bytes) {
            Ok(frame) => frame,
            Err(error) => {
                tracing::warn!(%error, "Undecodable gateway document; ignoring");
                return Ok(None);
            }
        };

        if let Some(sequence) = frame.s {
            self.state.observe_sequence(sequence);
        }

        let Some(op) = frame.opcode() else {
            // Forward compatibility: unknown opcodes are never fatal
            tracing::debug!(op = frame.op, "Unknown opcode; ignoring");
            return Ok(None);
        };

        match op {
            OpCode::Hello => {
                self.handle_hello(frame, ctx).await?;
                Ok(None)
            }
            OpCode::Heartbeat => {
                // Server requested an immediate beat
                let sequence = self.state.sequence();
                let _ = ctx.outbound.send(GatewayFrame::heartbeat(sequence)).await;
                Ok(None)
            }
            OpCode::HeartbeatAck => {
                self.state.record_heartbeat_ack();
                if let Some(latency) = self.state.latency() {
                    tracing::trace!(
                        latency_ms = latency.as_millis() as u64,
                        "Heartbeat acknowledged"
                    );
                }
                Ok(None)
            }
            OpCode::Reconnect => {
                tracing::info!("Server requested reconnect");
                Ok(Some(ConnectionEnd::Resume))
            }
            OpCode::InvalidateSession => {
                let resumable = frame.d.as_ref().and_then(Value::as_bool).unwrap_or(false);
                tracing::warn!(resumable, "Session invalidated by server");
                let _ = self.state.transition(SessionStatus::Invalidated);
                self.state.clear_identity();
                self.dispatcher.dispatch(
                    lifecycle::SESSION_INVALIDATED,
                    json!({ "resumable": resumable }),
                );
                Ok(Some(ConnectionEnd::Reidentify))
            }
            OpCode::Dispatch => {
                self.handle_dispatch(frame, ctx).await;
                Ok(None)
            }
            _ => {
                tracing::debug!(%op, "Server sent a client-only opcode; ignoring");
                Ok(None)
            }
        }
    }

    /// Hello: start the heartbeat and authenticate (identify or resume)
    async fn handle_hello(
        &self,
        frame: GatewayFrame,
        ctx: &mut ConnectionCtx,
    ) -> Result<(), GatewayError> {
        let data: HelloData = serde_json::from_value(frame.d.unwrap_or_default())
            .map_err(|error| GatewayError::Protocol(format!("malformed hello payload: {error}")))?;
        let interval = Duration::from_millis(data.heartbeat_interval);
        self.state.set_heartbeat_interval(interval);

        if let Some(previous) = ctx.heartbeat.take() {
            previous.stop();
        }
        ctx.heartbeat = Some(HeartbeatScheduler::spawn(
            interval,
            self.state.clone(),
            ctx.outbound.clone(),
            ctx.liveness.clone(),
        ));

        if self.state.status() != SessionStatus::Resuming {
            self.state.transition(SessionStatus::Identifying)?;
        }
        ctx.outbound
            .send(self.auth_frame())
            .await
            .map_err(|_| GatewayError::NotConnected)?;
        Ok(())
    }

    /// The authentication frame the client answers Hello with
    ///
    /// A surviving session resumes with its last observed sequence; a fresh
    /// identify happens only on first connect or after explicit invalidation.
    pub fn auth_frame(&self) -> GatewayFrame {
        if self.state.status() == SessionStatus::Resuming {
            let payload = ResumePayload {
                token: self.config.auth.token.clone(),
                session_id: self.state.session_id().unwrap_or_default(),
                seq: self.state.sequence().unwrap_or(0),
            };
            tracing::info!(seq = payload.seq, "Resuming session");
            GatewayFrame::resume(&payload)
        } else {
            tracing::info!("Identifying");
            GatewayFrame::identify(&self.identify_payload())
        }
    }

    /// Route a dispatch event: session bookkeeping, bootstrap jobs, cache
    /// maintenance, then handler fan-out
    async fn handle_dispatch(self: &Arc<Self>, frame: GatewayFrame, ctx: &ConnectionCtx) {
        let Some(name) = frame.t else {
            tracing::debug!("Dispatch frame without event name; ignoring");
            return;
        };
        let data = frame.d.unwrap_or(Value::Null);

        match GatewayEventType::from_str(&name) {
            Some(GatewayEventType::Ready) => match serde_json::from_value::<ReadyPayload>(
                data.clone(),
            ) {
                Ok(payload) => {
                    if let Some(session_id) = payload.session_id.clone() {
                        self.state
                            .set_identity(session_id, payload.resume_gateway_url.clone());
                    }
                    if let Err(error) = self.state.transition(SessionStatus::Connected) {
                        tracing::warn!(%error, "Ready received in unexpected state");
                    }
                    if let Some(user) = &payload.user {
                        let _ = self.cache.upsert_user(user).await;
                    }
                    if ctx
                        .bootstrap
                        .send(BootstrapJob::Ready(Box::new(payload)))
                        .await
                        .is_err()
                    {
                        tracing::warn!("Bootstrap worker unavailable");
                    }
                }
                Err(error) => tracing::warn!(%error, "Malformed ready payload"),
            },
            Some(GatewayEventType::ReadySupplemental) => {
                match serde_json::from_value::<ReadySupplementalPayload>(data.clone()) {
                    Ok(payload) => {
                        if ctx
                            .bootstrap
                            .send(BootstrapJob::Supplemental(Box::new(payload)))
                            .await
                            .is_err()
                        {
                            tracing::warn!("Bootstrap worker unavailable");
                        }
                    }
                    Err(error) => tracing::warn!(%error, "Malformed supplemental payload"),
                }
            }
            Some(GatewayEventType::Resumed) => {
                if let Err(error) = self.state.transition(SessionStatus::Connected) {
                    tracing::warn!(%error, "Resumed received in unexpected state");
                } else {
                    tracing::info!("Session resumed");
                }
            }
            Some(event) => {
                // Cache maintenance runs off the read loop like any handler
                let cache = self.cache.clone();
                let payload = data.clone();
                tokio::spawn(async move {
                    cache_events::apply_cache_event(cache, event, payload).await;
                });
            }
            None => {
                tracing::trace!(event = %name, "Unrecognized event name");
            }
        }

        self.dispatcher.dispatch(&name, data);
    }

    /// Build the identify payload from configuration, serialized verbatim
    fn identify_payload(&self) -> IdentifyPayload {
        IdentifyPayload {
            token: self.config.auth.token.clone(),
            capabilities: self.config.auth.capabilities,
            properties: ClientProperties::from(&self.config.identity),
            presence: PresencePayload::default(),
            // The continuous zlib stream is negotiated by URL; payload-level
            // compression stays off
            compress: false,
            client_state: ClientState::default(),
        }
    }
}

impl std::fmt::Debug for GatewaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySession")
            .field("status", &self.state.status())
            .field("session_id", &self.state.session_id())
            .finish()
    }
}

/// Exponential backoff with jitter, capped
fn reconnect_delay(config: &ReconnectConfig, failures: u32) -> Duration {
    let exponent = failures.min(6);
    let base = config
        .base_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(config.max_delay_ms);
    let jitter = rand::thread_rng().gen_range(0..=base / 4 + 1);
    Duration::from_millis(base.saturating_add(jitter))
}
