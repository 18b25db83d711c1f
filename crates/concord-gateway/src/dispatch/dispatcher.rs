//! Event dispatcher
//!
//! Routes a decoded event name to its registered handlers and fans each one
//! out as its own task, so a slow handler can never stall frame ingestion or
//! heartbeat delivery. Dispatch is issued in frame-arrival order; handler
//! completion order is unspecified.

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Boxed event handler
pub type EventHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Named-event subscription registry and fan-out
#[derive(Default)]
pub struct Dispatcher {
    handlers: DashMap<String, Vec<EventHandler>>,
}

impl Dispatcher {
    /// Create an empty dispatcher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a named event
    ///
    /// Multiple handlers may be registered for the same event; each runs
    /// concurrently with the others and with frame ingestion.
    pub fn on<F, Fut>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let wrapped: EventHandler = Arc::new(move |payload| Box::pin(handler(payload)));
        self.handlers.entry(event.into()).or_default().push(wrapped);
    }

    /// Number of handlers registered for an event
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, |list| list.len())
    }

    /// Fan an event out to its handlers; returns how many were spawned
    ///
    /// Events with no registered handlers are dropped silently: the server
    /// may introduce new event names at any time.
    pub fn dispatch(&self, event: &str, payload: Value) -> usize {
        // Clone the handler list out of the map so registration from inside
        // a handler never contends with fan-out.
        let handlers: Vec<EventHandler> = match self.handlers.get(event) {
            Some(list) => list.clone(),
            None => {
                tracing::trace!(event, "No handlers registered, dropping event");
                return 0;
            }
        };

        for handler in &handlers {
            let handler = handler.clone();
            let payload = payload.clone();
            tokio::spawn(async move {
                handler(payload).await;
            });
        }
        handlers.len()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("events", &self.handlers.len())
            .finish()
    }
}
