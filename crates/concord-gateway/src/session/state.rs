//! Session state machine
//!
//! Holds session identity (session id, resume URL, last sequence) and the
//! connection status with its transition rules. Mutated only by the session
//! orchestrator and the heartbeat bookkeeping paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use thiserror::Error;

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// No connection; terminal unless a new connect is requested
    Disconnected,
    /// Socket handshake in progress
    Connecting,
    /// Socket open, waiting for the server's Hello
    AwaitingHello,
    /// Identify sent, waiting for the bootstrap ready event
    Identifying,
    /// Session fully established
    Connected,
    /// Transport dropped with a resumable session; Resume will be sent
    Resuming,
    /// Server invalidated the session; next connection must re-identify
    Invalidated,
}

impl SessionStatus {
    /// Check whether a transition to `next` is legal
    ///
    /// Teardown to `Disconnected` is allowed from any state.
    #[must_use]
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::{
            AwaitingHello, Connected, Connecting, Disconnected, Identifying, Invalidated, Resuming,
        };
        matches!(
            (self, next),
            (_, Disconnected)
                | (Disconnected, Connecting)
                | (Connecting, AwaitingHello)
                | (AwaitingHello, Identifying)
                | (Identifying, Connected)
                | (Connected, Resuming)
                | (Connected | Resuming, Invalidated)
                | (Resuming, Connected)
                | (Invalidated, Connecting | Identifying)
        )
    }

    /// Check if the session counts as live for heartbeat purposes
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connected | Self::Resuming)
    }
}

/// Illegal state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid session state transition: {from:?} -> {to:?}")]
pub struct StateError {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

/// Shared session state
///
/// Lives for the whole session object, across physical reconnects; identity
/// fields survive a transport drop so the next connection can resume.
#[derive(Debug)]
pub struct SessionState {
    status: RwLock<SessionStatus>,
    session_id: RwLock<Option<String>>,
    resume_url: RwLock<Option<String>>,
    sequence: RwLock<Option<u64>>,
    heartbeat_interval: RwLock<Option<Duration>>,
    last_heartbeat_sent_at: RwLock<Option<Instant>>,
    last_heartbeat_acked_at: RwLock<Option<Instant>>,
    latency: RwLock<Option<Duration>>,
    heartbeat_acked: AtomicBool,
}

impl SessionState {
    /// Create a disconnected session state
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: RwLock::new(SessionStatus::Disconnected),
            session_id: RwLock::new(None),
            resume_url: RwLock::new(None),
            sequence: RwLock::new(None),
            heartbeat_interval: RwLock::new(None),
            last_heartbeat_sent_at: RwLock::new(None),
            last_heartbeat_acked_at: RwLock::new(None),
            latency: RwLock::new(None),
            heartbeat_acked: AtomicBool::new(true),
        }
    }

    /// Current status
    pub fn status(&self) -> SessionStatus {
        *self.status.read()
    }

    /// Transition to a new status, enforcing the transition table
    pub fn transition(&self, to: SessionStatus) -> Result<(), StateError> {
        let mut status = self.status.write();
        let from = *status;
        if !from.can_transition_to(to) {
            return Err(StateError { from, to });
        }
        *status = to;
        tracing::debug!(?from, ?to, "Session state transition");
        Ok(())
    }

    /// Record session identity from the bootstrap ready payload
    pub fn set_identity(&self, session_id: String, resume_url: Option<String>) {
        *self.session_id.write() = Some(session_id);
        *self.resume_url.write() = resume_url;
    }

    /// Clear identity and sequence; the next connection must re-identify
    pub fn clear_identity(&self) {
        *self.session_id.write() = None;
        *self.resume_url.write() = None;
        *self.sequence.write() = None;
    }

    /// Session id, if a ready payload has been received
    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().clone()
    }

    /// Gateway URL to reconnect to for resume
    pub fn resume_url(&self) -> Option<String> {
        self.resume_url.read().clone()
    }

    /// Whether a resume is possible (identity and sequence retained)
    pub fn can_resume(&self) -> bool {
        self.session_id.read().is_some() && self.sequence.read().is_some()
    }

    /// Record an observed dispatch sequence number
    ///
    /// Sequences are monotonically non-decreasing; a stale value never
    /// rewinds the stored one.
    pub fn observe_sequence(&self, sequence: u64) {
        let mut current = self.sequence.write();
        match *current {
            Some(existing) if existing >= sequence => {}
            _ => *current = Some(sequence),
        }
    }

    /// Last observed sequence number
    pub fn sequence(&self) -> Option<u64> {
        *self.sequence.read()
    }

    /// Record the heartbeat interval supplied by Hello
    pub fn set_heartbeat_interval(&self, interval: Duration) {
        *self.heartbeat_interval.write() = Some(interval);
    }

    /// Heartbeat interval, once Hello has been received
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        *self.heartbeat_interval.read()
    }

    /// Record that a heartbeat was just sent
    pub fn record_heartbeat_sent(&self) {
        *self.last_heartbeat_sent_at.write() = Some(Instant::now());
        self.heartbeat_acked.store(false, Ordering::SeqCst);
    }

    /// Record a heartbeat acknowledgement and compute round-trip latency
    pub fn record_heartbeat_ack(&self) {
        let now = Instant::now();
        *self.last_heartbeat_acked_at.write() = Some(now);
        if let Some(sent) = *self.last_heartbeat_sent_at.read() {
            *self.latency.write() = Some(now.saturating_duration_since(sent));
        }
        self.heartbeat_acked.store(true, Ordering::SeqCst);
    }

    /// Whether the last sent heartbeat has been acknowledged
    pub fn heartbeat_acked(&self) -> bool {
        self.heartbeat_acked.load(Ordering::SeqCst)
    }

    /// Reset heartbeat bookkeeping for a fresh connection
    pub fn reset_heartbeat(&self) {
        *self.last_heartbeat_sent_at.write() = None;
        *self.last_heartbeat_acked_at.write() = None;
        self.heartbeat_acked.store(true, Ordering::SeqCst);
    }

    /// Last measured heartbeat round-trip latency
    pub fn latency(&self) -> Option<Duration> {
        *self.latency.read()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [SessionStatus; 7] = [
        SessionStatus::Disconnected,
        SessionStatus::Connecting,
        SessionStatus::AwaitingHello,
        SessionStatus::Identifying,
        SessionStatus::Connected,
        SessionStatus::Resuming,
        SessionStatus::Invalidated,
    ];

    /// The complete transition table; everything not listed is illegal.
    fn allowed(from: SessionStatus, to: SessionStatus) -> bool {
        use SessionStatus::{
            AwaitingHello, Connected, Connecting, Disconnected, Identifying, Invalidated, Resuming,
        };
        matches!(
            (from, to),
            (_, Disconnected)
                | (Disconnected, Connecting)
                | (Connecting, AwaitingHello)
                | (AwaitingHello, Identifying)
                | (Identifying, Connected)
                | (Connected, Resuming)
                | (Connected, Invalidated)
                | (Resuming, Invalidated)
                | (Resuming, Connected)
                | (Invalidated, Connecting)
                | (Invalidated, Identifying)
        )
    }

    #[test]
    fn test_exhaustive_transition_table() {
        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed(from, to),
                    "transition {from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn test_connected_requires_identifying_or_resuming() {
        // No state other than Identifying/Resuming may reach Connected
        for from in ALL_STATUSES {
            if from.can_transition_to(SessionStatus::Connected) {
                assert!(matches!(
                    from,
                    SessionStatus::Identifying | SessionStatus::Resuming
                ));
            }
        }
    }

    #[test]
    fn test_transition_enforcement() {
        let state = SessionState::new();
        assert_eq!(state.status(), SessionStatus::Disconnected);

        state.transition(SessionStatus::Connecting).unwrap();
        state.transition(SessionStatus::AwaitingHello).unwrap();

        // Skipping Identifying is rejected
        let err = state.transition(SessionStatus::Connected).unwrap_err();
        assert_eq!(err.from, SessionStatus::AwaitingHello);
        assert_eq!(err.to, SessionStatus::Connected);

        state.transition(SessionStatus::Identifying).unwrap();
        state.transition(SessionStatus::Connected).unwrap();
        assert_eq!(state.status(), SessionStatus::Connected);
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let state = SessionState::new();
        assert_eq!(state.sequence(), None);

        state.observe_sequence(5);
        state.observe_sequence(3);
        assert_eq!(state.sequence(), Some(5));

        state.observe_sequence(9);
        assert_eq!(state.sequence(), Some(9));
    }

    #[test]
    fn test_resume_requires_identity_and_sequence() {
        let state = SessionState::new();
        assert!(!state.can_resume());

        state.set_identity("abc".to_string(), Some("wss://resume.example".to_string()));
        assert!(!state.can_resume());

        state.observe_sequence(42);
        assert!(state.can_resume());

        state.clear_identity();
        assert!(!state.can_resume());
        assert_eq!(state.sequence(), None);
    }

    #[test]
    fn test_heartbeat_latency_non_negative() {
        let state = SessionState::new();
        assert!(state.heartbeat_acked());

        state.record_heartbeat_sent();
        assert!(!state.heartbeat_acked());

        state.record_heartbeat_ack();
        assert!(state.heartbeat_acked());
        let latency = state.latency().unwrap();
        assert!(latency >= Duration::ZERO);
    }

    #[test]
    fn test_reset_heartbeat() {
        let state = SessionState::new();
        state.record_heartbeat_sent();
        assert!(!state.heartbeat_acked());

        state.reset_heartbeat();
        assert!(state.heartbeat_acked());
    }
}
