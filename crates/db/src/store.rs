//! PostgreSQL implementation of [`EntityStore`].
//!
//! Thin adapter over the repository functions: converts rows into domain
//! types and lifts `eyre` failures into `RepairError::StoreUnavailable`.

use async_trait::async_trait;
use chrono::NaiveDate;
use repairdesk_core::{
    errors::{RepairError, RepairResult},
    models::{
        appointment::{Appointment, AppointmentUpdate, NewAppointment},
        client::Client,
        notification::{NewNotification, Notification},
        service::{Service, ServiceUpdate},
        technician::{AvailabilityChange, Technician, TechnicianUpdate, User},
    },
    store::{EntityStore, TransitionCommit},
};
use uuid::Uuid;

use crate::{
    DbPool,
    repositories::{appointment, client, notification, service, user},
};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn convert<R, T>(row: R) -> RepairResult<T>
where
    T: TryFrom<R, Error = eyre::Report>,
{
    T::try_from(row).map_err(RepairError::StoreUnavailable)
}

fn convert_all<R, T>(rows: Vec<R>) -> RepairResult<Vec<T>>
where
    T: TryFrom<R, Error = eyre::Report>,
{
    rows.into_iter().map(convert).collect()
}

fn technician_from_row(row: crate::models::DbUser) -> RepairResult<Technician> {
    let user: User = convert(row)?;
    Technician::try_from(user)
}

#[async_trait]
impl EntityStore for PgStore {
    async fn get_service(&self, id: Uuid) -> RepairResult<Option<Service>> {
        service::get_service_by_id(&self.pool, id)
            .await?
            .map(convert)
            .transpose()
    }

    async fn get_service_by_appointment(
        &self,
        appointment_id: Uuid,
    ) -> RepairResult<Option<Service>> {
        service::get_service_by_appointment_id(&self.pool, appointment_id)
            .await?
            .map(convert)
            .transpose()
    }

    async fn update_service(&self, id: Uuid, update: ServiceUpdate) -> RepairResult<Service> {
        let row = service::update_service(&self.pool, id, &update)
            .await?
            .ok_or_else(|| RepairError::NotFound(format!("Service with ID {} not found", id)))?;
        convert(row)
    }

    async fn list_active_services(&self, technician_id: Uuid) -> RepairResult<Vec<Service>> {
        let rows = service::get_active_services_by_technician_id(&self.pool, technician_id).await?;
        convert_all(rows)
    }

    async fn get_appointment(&self, id: Uuid) -> RepairResult<Option<Appointment>> {
        appointment::get_appointment_by_id(&self.pool, id)
            .await?
            .map(convert)
            .transpose()
    }

    async fn create_appointment(&self, new: NewAppointment) -> RepairResult<Appointment> {
        let row = appointment::create_appointment(&self.pool, &new).await?;
        convert(row)
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        update: AppointmentUpdate,
    ) -> RepairResult<Appointment> {
        let row = appointment::update_appointment(&self.pool, id, &update)
            .await?
            .ok_or_else(|| {
                RepairError::NotFound(format!("Appointment with ID {} not found", id))
            })?;
        convert(row)
    }

    async fn list_client_appointments(&self, client_id: Uuid) -> RepairResult<Vec<Appointment>> {
        let rows = appointment::get_appointments_by_client_id(&self.pool, client_id).await?;
        convert_all(rows)
    }

    async fn accept_appointment(
        &self,
        appointment_id: Uuid,
        technician_id: Uuid,
    ) -> RepairResult<Service> {
        match appointment::accept_appointment(&self.pool, appointment_id, technician_id).await? {
            appointment::AcceptOutcome::Accepted(row) => convert(row),
            appointment::AcceptOutcome::NotFound => Err(RepairError::NotFound(format!(
                "Appointment with ID {} not found",
                appointment_id
            ))),
            appointment::AcceptOutcome::AlreadyDecided(mark_as) => {
                Err(RepairError::AlreadyDecided(mark_as.parse()?))
            }
        }
    }

    async fn get_client(&self, id: Uuid) -> RepairResult<Option<Client>> {
        client::get_client_by_id(&self.pool, id)
            .await?
            .map(convert)
            .transpose()
    }

    async fn get_user(&self, id: Uuid) -> RepairResult<Option<User>> {
        user::get_user_by_id(&self.pool, id)
            .await?
            .map(convert)
            .transpose()
    }

    async fn get_technician(&self, id: Uuid) -> RepairResult<Option<Technician>> {
        user::get_technician_by_id(&self.pool, id)
            .await?
            .map(technician_from_row)
            .transpose()
    }

    async fn update_technician(
        &self,
        id: Uuid,
        update: TechnicianUpdate,
    ) -> RepairResult<Technician> {
        let row = user::update_technician(&self.pool, id, &update)
            .await?
            .ok_or_else(|| RepairError::NotFound(format!("Technician with ID {} not found", id)))?;
        technician_from_row(row)
    }

    async fn apply_due_schedule(
        &self,
        id: Uuid,
        today: NaiveDate,
    ) -> RepairResult<Option<Technician>> {
        user::apply_due_schedule(&self.pool, id, today)
            .await?
            .map(technician_from_row)
            .transpose()
    }

    async fn find_technicians_scheduled_today(
        &self,
        today: NaiveDate,
    ) -> RepairResult<Vec<Technician>> {
        user::find_technicians_scheduled_on(&self.pool, today)
            .await?
            .into_iter()
            .map(technician_from_row)
            .collect()
    }

    async fn availability_history(
        &self,
        technician_id: Uuid,
    ) -> RepairResult<Vec<AvailabilityChange>> {
        let rows = user::get_availability_changes(&self.pool, technician_id).await?;
        convert_all(rows)
    }

    async fn create_notification(&self, new: NewNotification) -> RepairResult<Notification> {
        let row = notification::create_notification(&self.pool, &new).await?;
        convert(row)
    }

    async fn commit_transition(&self, commit: &TransitionCommit) -> RepairResult<()> {
        if service::commit_transition(&self.pool, commit).await? {
            return Ok(());
        }

        // Lost the compare-and-set: report where the service actually is.
        let current = self
            .get_service(commit.service_id)
            .await?
            .ok_or_else(|| {
                RepairError::NotFound(format!("Service with ID {} not found", commit.service_id))
            })?;
        Err(RepairError::InvalidTransition {
            from: current.status,
            to: commit.to,
        })
    }

    async fn user_has_services(&self, id: Uuid) -> RepairResult<bool> {
        Ok(user::has_services(&self.pool, id).await?)
    }

    async fn delete_user(&self, id: Uuid) -> RepairResult<bool> {
        if user::delete_user(&self.pool, id).await? {
            return Ok(true);
        }
        if user::has_services(&self.pool, id).await? {
            return Err(RepairError::Conflict(format!(
                "user {id} still has assigned services"
            )));
        }
        Ok(false)
    }
}
