//! Two-phase bootstrap reconciliation

mod reconciler;
mod worker;

pub use reconciler::{BootstrapReconciler, ReconciliationGap, ReconciliationReport};
pub use worker::{spawn_worker, BootstrapJob};
