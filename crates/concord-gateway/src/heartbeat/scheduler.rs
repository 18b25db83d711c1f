//! Heartbeat scheduler
//!
//! Sends a heartbeat carrying the last known sequence at the server-supplied
//! interval, indefinitely, until stopped. Ack bookkeeping lives on
//! `SessionState` (the read loop records acks); the scheduler only checks it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::protocol::GatewayFrame;
use crate::session::SessionState;

/// Liveness signal sent to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessSignal {
    /// No ack arrived before the next scheduled heartbeat: the session is
    /// zombied and the socket must be closed with the resume path preserved
    AckMissed,
}

/// Periodic heartbeat task for one physical connection
pub struct HeartbeatScheduler {
    handle: JoinHandle<()>,
}

impl HeartbeatScheduler {
    /// Spawn the heartbeat task
    ///
    /// Emits exactly one `LivenessSignal::AckMissed` and stops if a beat goes
    /// unacknowledged for a full interval. Stops silently when the outbound
    /// channel closes (connection teardown).
    pub fn spawn(
        interval: Duration,
        state: Arc<SessionState>,
        outbound: mpsc::Sender<GatewayFrame>,
        liveness: mpsc::Sender<LivenessSignal>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the first beat goes out
            // one full interval after Hello.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if !state.heartbeat_acked() {
                    tracing::warn!(
                        interval_ms = interval.as_millis() as u64,
                        "Heartbeat ack missed; session zombied"
                    );
                    let _ = liveness.send(LivenessSignal::AckMissed).await;
                    return;
                }

                let sequence = state.sequence();
                if outbound.send(GatewayFrame::heartbeat(sequence)).await.is_err() {
                    // Writer gone; the connection is already tearing down
                    return;
                }
                state.record_heartbeat_sent();
                tracing::trace!(?sequence, "Heartbeat sent");
            }
        });

        Self { handle }
    }

    /// Stop the scheduler immediately
    ///
    /// Must be called the instant the session leaves a live state so no beat
    /// fires against a stale socket.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
