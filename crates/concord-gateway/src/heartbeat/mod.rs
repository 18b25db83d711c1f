//! Heartbeat / liveness protocol

mod scheduler;

pub use scheduler::{HeartbeatScheduler, LivenessSignal};
