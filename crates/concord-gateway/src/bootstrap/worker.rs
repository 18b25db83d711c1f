//! Bootstrap worker task
//!
//! Reconciliation runs off the read loop so a large snapshot can never stall
//! frame ingestion or heartbeat delivery, but jobs drain in FIFO order, so
//! the primary payload is always reconciled before the supplemental one even
//! though both were dispatched fire-and-forget.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use concord_core::EntityCache;

use super::reconciler::BootstrapReconciler;
use crate::dispatch::Dispatcher;
use crate::events::{lifecycle, ReadyPayload, ReadySupplementalPayload};

/// Buffered bootstrap jobs per connection
const JOB_BUFFER: usize = 4;

/// One unit of reconciliation work
#[derive(Debug)]
pub enum BootstrapJob {
    /// Primary payload (READY)
    Ready(Box<ReadyPayload>),
    /// Deferred payload (READY_SUPPLEMENTAL)
    Supplemental(Box<ReadySupplementalPayload>),
}

/// Spawn the per-connection bootstrap worker
///
/// The worker owns the reconciler (and with it the transient correlation
/// context) and ends when the returned sender is dropped at connection
/// teardown. Lifecycle events fire only after the corresponding payload is
/// fully reconciled; that is the signal that startup consumers may run.
pub fn spawn_worker(
    cache: Arc<dyn EntityCache>,
    dispatcher: Arc<Dispatcher>,
) -> mpsc::Sender<BootstrapJob> {
    let (tx, mut rx) = mpsc::channel::<BootstrapJob>(JOB_BUFFER);

    tokio::spawn(async move {
        let mut reconciler = BootstrapReconciler::new(cache);

        while let Some(job) = rx.recv().await {
            match job {
                BootstrapJob::Ready(payload) => {
                    let report = reconciler.reconcile_ready(&payload).await;
                    dispatcher.dispatch(
                        lifecycle::SESSION_READY,
                        json!({
                            "guilds": report.guilds_registered,
                            "users": report.users_cached,
                            "relationships": report.relationships_recorded,
                        }),
                    );
                }
                BootstrapJob::Supplemental(payload) => {
                    let report = reconciler.reconcile_supplemental(&payload).await;
                    dispatcher.dispatch(
                        lifecycle::SESSION_READY_SUPPLEMENTAL,
                        json!({
                            "guilds": report.guilds_registered,
                            "members": report.members_attached,
                            "presences": report.presences_merged,
                            "gaps": report.gaps.len(),
                        }),
                    );
                }
            }
        }

        tracing::debug!("Bootstrap worker ended");
    });

    tx
}
