//! Scheduled sweep that applies due "unavailable from" dates.
//!
//! Each run selects the technicians whose scheduled date is today and who are
//! not already unavailable, flips each one to unavailable and clears the
//! schedule. The write re-checks the selection, so a row rescheduled or
//! toggled in between is skipped. Rows are handled independently: one failed
//! update is logged and counted, and the rest still go through. Runs are
//! serialised so two ticks never work the same rows at once.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use repairdesk_core::{clock::Clock, errors::RepairResult, store::EntityStore};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub updated_count: usize,
    /// Selected rows that were rescheduled or toggled before the write.
    pub skipped_count: usize,
    pub failed_count: usize,
}

pub struct Sweeper {
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
    running: Mutex<()>,
}

impl Sweeper {
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            running: Mutex::new(()),
        }
    }

    /// Sweeps for the shop's current calendar day.
    pub async fn run_today(&self) -> RepairResult<SweepReport> {
        self.run(self.clock.today()).await
    }

    pub async fn run(&self, today: NaiveDate) -> RepairResult<SweepReport> {
        let _guard = self.running.lock().await;

        let due = self.store.find_technicians_scheduled_today(today).await?;
        if due.is_empty() {
            tracing::info!(%today, "Sweep: no updates found");
            return Ok(SweepReport::default());
        }

        let mut report = SweepReport::default();
        for technician in due {
            match self.store.apply_due_schedule(technician.id, today).await {
                Ok(Some(_)) => {
                    report.updated_count += 1;
                    tracing::info!(technician_id = %technician.id, %today, "Sweep: technician marked unavailable");
                }
                Ok(None) => {
                    report.skipped_count += 1;
                    tracing::info!(technician_id = %technician.id, %today, "Sweep: technician no longer due, skipped");
                }
                Err(e) => {
                    report.failed_count += 1;
                    tracing::error!(technician_id = %technician.id, %today, error = %e, "Sweep: failed to update technician");
                }
            }
        }

        tracing::info!(
            %today,
            updated = report.updated_count,
            skipped = report.skipped_count,
            failed = report.failed_count,
            "Sweep finished"
        );
        Ok(report)
    }

    /// Sweeps on every tick of `interval` until `cancel` fires. The first tick
    /// is immediate so a restarted server catches up on the current day.
    pub async fn run_periodic(&self, interval: Duration, cancel: CancellationToken) {
        tracing::info!(interval_secs = interval.as_secs(), "Sweep loop started");

        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Sweep loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_today().await {
                        tracing::error!(error = %e, "Sweep run failed");
                    }
                }
            }
        }
    }
}
