//! Integration test utilities for the Concord gateway client
//!
//! Provides fixture builders for bootstrap payloads and compressed gateway
//! traffic.

pub mod fixtures;

pub use fixtures::*;
