//! # concord-cache
//!
//! In-process implementation of the `EntityCache` collaborator trait.
//!
//! One `MemoryCache` is owned per session, not per process; dispatch handlers
//! and the bootstrap reconciler share it concurrently. Every mutation is a
//! single atomic check-existence-then-insert-or-merge on the relevant map.

pub mod memory;

pub use memory::MemoryCache;
