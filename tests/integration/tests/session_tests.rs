//! Session lifecycle integration tests
//!
//! Run with: cargo test -p integration-tests --test session_tests

use std::sync::Arc;
use std::time::Duration;

use concord_cache::MemoryCache;
use concord_common::{
    AppSettings, AuthConfig, ClientConfig, Environment, GatewayEndpoint, IdentityConfig,
    ReconnectConfig,
};
use concord_core::Capabilities;
use concord_gateway::{
    GatewaySession, HeartbeatScheduler, OpCode, SessionState, SessionStatus,
};
use tokio::sync::mpsc;

fn config() -> ClientConfig {
    ClientConfig {
        app: AppSettings {
            name: "concord-test".to_string(),
            env: Environment::Development,
        },
        gateway: GatewayEndpoint {
            url: "wss://gateway.concord.test".to_string(),
            protocol_version: 9,
            compress: true,
            legacy_member_requests: false,
        },
        auth: AuthConfig {
            token: "token-xyz".to_string(),
            capabilities: Capabilities::default(),
        },
        identity: IdentityConfig {
            os: "linux".to_string(),
            browser: "Concord Client".to_string(),
            client_version: "0.1.0".to_string(),
            client_build_number: 1,
            release_channel: "stable".to_string(),
            locale: "en-US".to_string(),
        },
        reconnect: ReconnectConfig::default(),
    }
}

fn session() -> Arc<GatewaySession> {
    GatewaySession::new(config(), Arc::new(MemoryCache::new()))
}

// ============================================================================
// Resume contract
// ============================================================================

#[tokio::test]
async fn test_reconnect_resumes_with_last_sequence() {
    let session = session();
    let state = session.state();

    // First life of the session: connect, identify, go live
    state.transition(SessionStatus::Connecting).unwrap();
    state.transition(SessionStatus::AwaitingHello).unwrap();
    state.transition(SessionStatus::Identifying).unwrap();
    state.set_identity(
        "session-abc".to_string(),
        Some("wss://resume.concord.test".to_string()),
    );
    state.transition(SessionStatus::Connected).unwrap();
    state.observe_sequence(42);

    // Transport drops; the session enters the resume path
    state.transition(SessionStatus::Resuming).unwrap();

    let frame = session.auth_frame();
    assert_eq!(frame.opcode(), Some(OpCode::Resume));
    let d = frame.d.unwrap();
    assert_eq!(d["seq"], 42);
    assert_eq!(d["session_id"], "session-abc");
}

#[tokio::test]
async fn test_invalidated_session_identifies_instead_of_resuming() {
    let session = session();
    let state = session.state();

    state.transition(SessionStatus::Connecting).unwrap();
    state.transition(SessionStatus::AwaitingHello).unwrap();
    state.transition(SessionStatus::Identifying).unwrap();
    state.set_identity("session-abc".to_string(), None);
    state.transition(SessionStatus::Connected).unwrap();
    state.observe_sequence(42);

    // Server invalidates: identity is gone and the path leads back through
    // Identifying
    state.transition(SessionStatus::Invalidated).unwrap();
    state.clear_identity();
    assert!(!state.can_resume());

    state.transition(SessionStatus::Identifying).unwrap();
    let frame = session.auth_frame();
    assert_eq!(frame.opcode(), Some(OpCode::Identify));
    let d = frame.d.unwrap();
    assert_eq!(d["token"], "token-xyz");
    assert!(d["seq"].is_null());
}

#[tokio::test]
async fn test_fresh_session_identifies() {
    let session = session();
    let frame = session.auth_frame();
    assert_eq!(frame.opcode(), Some(OpCode::Identify));
    // The identity block is serialized verbatim from configuration
    let d = frame.d.unwrap();
    assert_eq!(d["properties"]["os"], "linux");
    assert_eq!(d["properties"]["system-locale"], "en-US");
    assert_eq!(d["compress"], false);
}

// ============================================================================
// Heartbeat liveness against shared state
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_zombied_session_detected_exactly_once() {
    let state = Arc::new(SessionState::new());
    state.observe_sequence(7);
    let (outbound_tx, mut outbound_rx) = mpsc::channel(8);
    let (liveness_tx, mut liveness_rx) = mpsc::channel(1);

    let _scheduler = HeartbeatScheduler::spawn(
        Duration::from_secs(41),
        state.clone(),
        outbound_tx,
        liveness_tx,
    );

    // Beat goes out with the retained sequence, unacked
    tokio::time::advance(Duration::from_secs(41)).await;
    let frame = outbound_rx.recv().await.unwrap();
    assert_eq!(frame.to_json().unwrap(), r#"{"op":1,"d":7}"#);

    // One interval later the zombie is detected, once
    tokio::time::advance(Duration::from_secs(41)).await;
    assert!(liveness_rx.recv().await.is_some());
    tokio::time::advance(Duration::from_secs(120)).await;
    assert!(liveness_rx.try_recv().is_err());
    assert!(outbound_rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_acked_heartbeats_keep_session_alive() {
    let state = Arc::new(SessionState::new());
    let (outbound_tx, mut outbound_rx) = mpsc::channel(8);
    let (liveness_tx, mut liveness_rx) = mpsc::channel(1);

    let _scheduler = HeartbeatScheduler::spawn(
        Duration::from_secs(41),
        state.clone(),
        outbound_tx,
        liveness_tx,
    );

    for _ in 0..5 {
        tokio::time::advance(Duration::from_secs(41)).await;
        assert!(outbound_rx.recv().await.is_some());
        state.record_heartbeat_ack();
        let latency = state.latency().unwrap();
        assert!(latency >= Duration::ZERO);
    }
    assert!(liveness_rx.try_recv().is_err());
}

// ============================================================================
// Send path while disconnected
// ============================================================================

#[tokio::test]
async fn test_sends_fail_cleanly_when_disconnected() {
    let session = session();

    // In-flight handlers may keep calling into the session after teardown;
    // sends become errors, not crashes.
    assert!(session.update_presence("idle").await.is_err());
    assert!(session
        .request_members(concord_core::Snowflake::new(1), concord_core::Snowflake::new(2), 250)
        .await
        .is_err());
}
