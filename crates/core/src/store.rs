//! The Entity Store contract.
//!
//! Every persisted row is owned by the store. Services never keep copies of
//! entities between calls; they re-read, decide, and write back through this
//! trait. Implementations must give the calling process read-your-writes
//! consistency.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::RepairResult;
use crate::lifecycle::TransitionPlan;
use crate::models::{
    appointment::{Appointment, AppointmentUpdate, NewAppointment},
    client::Client,
    notification::{NewNotification, Notification},
    service::{Service, ServiceStatus, ServiceUpdate},
    technician::{AvailabilityChange, Technician, TechnicianStatus, TechnicianUpdate, User},
};

/// Everything one transition writes, committed as a single unit.
///
/// `from` is the status the caller observed; the store refuses the commit
/// with `InvalidTransition` if the service has moved on since.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionCommit {
    pub service_id: Uuid,
    pub appointment_id: Uuid,
    pub technician_id: Uuid,
    pub from: ServiceStatus,
    pub to: ServiceStatus,
    pub price: Option<Decimal>,
    pub technician_note: Option<String>,
    pub technician_status: Option<TechnicianStatus>,
    pub notification: Option<NewNotification>,
    pub idempotency_key: Option<Uuid>,
}

impl TransitionCommit {
    pub fn from_plan(
        service: &Service,
        plan: TransitionPlan,
        notification: Option<NewNotification>,
        idempotency_key: Option<Uuid>,
    ) -> Self {
        Self {
            service_id: service.id,
            appointment_id: service.appointment_id,
            technician_id: service.technician_id,
            from: plan.from,
            to: plan.to,
            price: plan.price,
            technician_note: plan.technician_note,
            technician_status: plan.technician_status,
            notification,
            idempotency_key,
        }
    }
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_service(&self, id: Uuid) -> RepairResult<Option<Service>>;

    async fn get_service_by_appointment(&self, appointment_id: Uuid)
    -> RepairResult<Option<Service>>;

    async fn update_service(&self, id: Uuid, update: ServiceUpdate) -> RepairResult<Service>;

    /// Services assigned to the technician that are neither completed nor canceled.
    async fn list_active_services(&self, technician_id: Uuid) -> RepairResult<Vec<Service>>;

    async fn get_appointment(&self, id: Uuid) -> RepairResult<Option<Appointment>>;

    async fn create_appointment(&self, new: NewAppointment) -> RepairResult<Appointment>;

    async fn update_appointment(
        &self,
        id: Uuid,
        update: AppointmentUpdate,
    ) -> RepairResult<Appointment>;

    async fn list_client_appointments(&self, client_id: Uuid) -> RepairResult<Vec<Appointment>>;

    /// Marks the appointment accepted and creates its one service, atomically.
    /// Fails with `AlreadyDecided` unless the appointment is still undecided.
    async fn accept_appointment(
        &self,
        appointment_id: Uuid,
        technician_id: Uuid,
    ) -> RepairResult<Service>;

    async fn get_client(&self, id: Uuid) -> RepairResult<Option<Client>>;

    async fn get_user(&self, id: Uuid) -> RepairResult<Option<User>>;

    /// `None` for missing rows and for users that are not technicians.
    async fn get_technician(&self, id: Uuid) -> RepairResult<Option<Technician>>;

    /// Writes a technician row and, when the status is set, appends to the
    /// availability log. Never matches non-technician users.
    async fn update_technician(
        &self,
        id: Uuid,
        update: TechnicianUpdate,
    ) -> RepairResult<Technician>;

    /// Marks the technician unavailable and clears the schedule, but only while
    /// the row is still scheduled for `today` and not already unavailable.
    /// `None` means the row no longer matches and nothing was written.
    async fn apply_due_schedule(
        &self,
        id: Uuid,
        today: NaiveDate,
    ) -> RepairResult<Option<Technician>>;

    /// Technicians whose scheduled date is `today` and who are not already unavailable.
    async fn find_technicians_scheduled_today(
        &self,
        today: NaiveDate,
    ) -> RepairResult<Vec<Technician>>;

    async fn availability_history(
        &self,
        technician_id: Uuid,
    ) -> RepairResult<Vec<AvailabilityChange>>;

    async fn create_notification(&self, new: NewNotification) -> RepairResult<Notification>;

    async fn commit_transition(&self, commit: &TransitionCommit) -> RepairResult<()>;

    /// Whether any service, in any status, is assigned to the user.
    async fn user_has_services(&self, id: Uuid) -> RepairResult<bool>;

    /// Returns `false` when there was no such user. Users still referenced by
    /// a service are kept and reported as `Conflict`; services are never deleted.
    async fn delete_user(&self, id: Uuid) -> RepairResult<bool>;
}
