//! Event dispatch

mod dispatcher;

pub use dispatcher::{Dispatcher, EventHandler};
