//! Overlap-guarded job runner.
//!
//! [`JobRunner::enqueue`] takes the job's lease synchronously and then hands
//! the work to a spawned task, so the caller never waits on the job body.
//! A second enqueue of the same `(kind, key)` while the lease is held is
//! absorbed as [`EnqueueOutcome::Overlapping`]. Failed jobs are logged and
//! dropped; their lease is left to expire so a corrected resubmission can run
//! once it does.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::jobs::{Job, JobHandler};
use crate::lease::LeaseTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed(String),
}

#[derive(Debug)]
pub struct JobTicket {
    lease_key: String,
    handle: JoinHandle<JobOutcome>,
}

impl JobTicket {
    pub fn lease_key(&self) -> &str {
        &self.lease_key
    }

    /// Waits for the job to finish. Only tests and the one-shot binaries need
    /// this; request handlers drop the ticket.
    pub async fn wait(self) -> JobOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => JobOutcome::Failed(format!("job task did not finish: {e}")),
        }
    }
}

#[derive(Debug)]
pub enum EnqueueOutcome {
    Started(JobTicket),
    Overlapping,
}

impl EnqueueOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, EnqueueOutcome::Started(_))
    }

    pub fn ticket(self) -> Option<JobTicket> {
        match self {
            EnqueueOutcome::Started(ticket) => Some(ticket),
            EnqueueOutcome::Overlapping => None,
        }
    }
}

#[derive(Clone)]
pub struct JobRunner {
    handler: Arc<dyn JobHandler>,
    leases: Arc<LeaseTable>,
}

impl JobRunner {
    pub fn new(handler: Arc<dyn JobHandler>, leases: Arc<LeaseTable>) -> Self {
        Self { handler, leases }
    }

    pub fn leases(&self) -> &LeaseTable {
        &self.leases
    }

    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, job: Job) -> EnqueueOutcome {
        let lease_key = job.lease_key();
        let job_kind = job.kind();

        if !self.leases.try_acquire(&lease_key) {
            tracing::info!(%job_kind, job_key = %job.key(), "Job already in flight, not starting another");
            return EnqueueOutcome::Overlapping;
        }

        let handler = self.handler.clone();
        let leases = self.leases.clone();
        let key = lease_key.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(%job_kind, job_key = %job.key(), "Job started");

            match handler.handle(&job).await {
                Ok(()) => {
                    leases.release(&key);
                    tracing::info!(%job_kind, job_key = %job.key(), "Job succeeded");
                    JobOutcome::Succeeded
                }
                Err(e) => {
                    tracing::error!(%job_kind, job_key = %job.key(), error = %e, "Job failed");
                    JobOutcome::Failed(e.to_string())
                }
            }
        });

        EnqueueOutcome::Started(JobTicket { lease_key, handle })
    }
}
