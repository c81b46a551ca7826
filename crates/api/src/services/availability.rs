//! # Technician Availability
//!
//! Manual availability controls. The lifecycle and the sweep write the same
//! status column through [`EntityStore::update_technician`], so the value is
//! last-write-wins; the availability log records which writer set it.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use repairdesk_core::{
    clock::Clock,
    errors::{RepairError, RepairResult},
    models::technician::{
        Availability, AvailabilityChange, AvailabilitySource, Technician, TechnicianStatus,
        TechnicianUpdate,
    },
    store::EntityStore,
};
use uuid::Uuid;

use super::bounded;

pub struct AvailabilityManager {
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl AvailabilityManager {
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>, store_timeout: Duration) -> Self {
        Self {
            store,
            clock,
            store_timeout,
        }
    }

    /// Operator toggle. Always allowed, whatever the technician is working on.
    pub async fn set_availability(
        &self,
        technician_id: Uuid,
        status: TechnicianStatus,
    ) -> RepairResult<Technician> {
        let technician = bounded(
            self.store_timeout,
            self.store.update_technician(
                technician_id,
                TechnicianUpdate::status(status, AvailabilitySource::Manual),
            ),
        )
        .await?;

        tracing::info!(%technician_id, %status, "Technician availability set");
        Ok(technician)
    }

    /// Sets the day a technician becomes unavailable, or clears it with `None`.
    /// The date must fall after the shop's current day.
    pub async fn schedule_unavailable_from(
        &self,
        technician_id: Uuid,
        date: Option<NaiveDate>,
    ) -> RepairResult<Technician> {
        if let Some(date) = date {
            let today = self.clock.today();
            if date <= today {
                return Err(RepairError::InvalidDate(format!(
                    "{date} must be after today ({today})"
                )));
            }
        }

        let technician = bounded(
            self.store_timeout,
            self.store
                .update_technician(technician_id, TechnicianUpdate::schedule(date)),
        )
        .await?;

        match date {
            Some(date) => tracing::info!(%technician_id, %date, "Technician unavailability scheduled"),
            None => tracing::info!(%technician_id, "Technician unavailability schedule cleared"),
        }
        Ok(technician)
    }

    pub async fn get_availability(&self, technician_id: Uuid) -> RepairResult<Availability> {
        let technician = self.load(technician_id).await?;
        Ok(Availability::from(&technician))
    }

    /// Status writes for the technician, newest first.
    pub async fn availability_history(
        &self,
        technician_id: Uuid,
    ) -> RepairResult<Vec<AvailabilityChange>> {
        self.load(technician_id).await?;
        bounded(
            self.store_timeout,
            self.store.availability_history(technician_id),
        )
        .await
    }

    async fn load(&self, technician_id: Uuid) -> RepairResult<Technician> {
        bounded(self.store_timeout, self.store.get_technician(technician_id))
            .await?
            .ok_or_else(|| {
                RepairError::NotFound(format!("Technician with ID {} not found", technician_id))
            })
    }
}
