//! Orchestration between the HTTP handlers and the entity store.

pub mod availability;
pub mod keyed_lock;
pub mod lifecycle;

use std::future::Future;
use std::time::Duration;

use repairdesk_core::errors::{RepairError, RepairResult};

pub use availability::AvailabilityManager;
pub use keyed_lock::KeyedLock;
pub use lifecycle::{LifecycleService, TransitionOutcome};

/// Runs one store call under `limit`. A call that overruns is dropped, which
/// rolls back any transaction it had open, and reported as `StoreUnavailable`.
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = RepairResult<T>>,
) -> RepairResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RepairError::StoreUnavailable(eyre::eyre!(
            "entity store call timed out after {}ms",
            limit.as_millis()
        ))),
    }
}
