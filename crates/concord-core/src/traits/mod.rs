//! Traits (ports) - interfaces the gateway core consumes

mod cache;

pub use cache::{CacheResult, EntityCache};
