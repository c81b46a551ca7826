//! # Lifecycle Service
//!
//! Applies status transitions to work orders and runs the triage steps that
//! create them. Every call re-reads the rows it needs, decides with the pure
//! rules in [`repairdesk_core::lifecycle`], and writes the result back through
//! the entity store in one commit. Broadcasts and background jobs follow the
//! commit and never undo it.
//!
//! Transitions on one service are serialised in-process with a keyed lock; the
//! store's compare-and-set on the previous status covers other processes.

use std::sync::Arc;
use std::time::Duration;

use repairdesk_core::{
    clock::Clock,
    errors::{RepairError, RepairResult},
    events::{Broadcaster, ChangeEvent, names, topics},
    lifecycle::{TransitionRequest, plan_transition},
    models::{
        appointment::{
            Appointment, AppointmentStage, AppointmentUpdate, MarkAs, NewAppointment,
        },
        notification::NewNotification,
        service::Service,
    },
    store::{EntityStore, TransitionCommit},
};
use repairdesk_worker::{EnqueueOutcome, Job, JobRunner};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::{KeyedLock, bounded};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionOutcome {
    pub service: Service,
    /// True when the request repeated an already-applied idempotency key.
    pub replayed: bool,
}

pub struct LifecycleService {
    store: Arc<dyn EntityStore>,
    broadcaster: Arc<dyn Broadcaster>,
    jobs: JobRunner,
    clock: Arc<dyn Clock>,
    locks: KeyedLock,
    store_timeout: Duration,
}

impl LifecycleService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        broadcaster: Arc<dyn Broadcaster>,
        jobs: JobRunner,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            broadcaster,
            jobs,
            clock,
            locks: KeyedLock::new(),
            store_timeout,
        }
    }

    /// Moves a service along one lifecycle edge on behalf of its technician.
    ///
    /// Order of effects: service status (plus appointment status and price),
    /// technician availability, the zero-price notification, then the
    /// `ServicesUpdated` broadcast and the appointment rebroadcast job. The
    /// first three are one atomic commit.
    pub async fn transition(
        &self,
        service_id: Uuid,
        technician_id: Uuid,
        request: TransitionRequest,
    ) -> RepairResult<TransitionOutcome> {
        let _guard = self.locks.acquire(service_id).await;

        let mut service = bounded(self.store_timeout, self.store.get_service(service_id))
            .await?
            .ok_or_else(|| RepairError::NotFound(format!("Service with ID {} not found", service_id)))?;

        if service.technician_id != technician_id {
            return Err(RepairError::Authorization(format!(
                "service {} is not assigned to technician {}",
                service_id, technician_id
            )));
        }

        if let Some(key) = request.idempotency_key {
            if service.last_transition_key == Some(key) && service.status == request.target {
                tracing::info!(%service_id, %key, "Transition already applied, replaying result");
                return Ok(TransitionOutcome {
                    service,
                    replayed: true,
                });
            }
        }

        let plan = plan_transition(service.status, &request)?;

        let appointment = bounded(
            self.store_timeout,
            self.store.get_appointment(service.appointment_id),
        )
        .await?
        .ok_or_else(|| {
            RepairError::NotFound(format!(
                "Appointment with ID {} not found",
                service.appointment_id
            ))
        })?;

        let notification = match plan.zero_price_note.as_deref() {
            Some(note) => Some(self.zero_price_notification(&service, &appointment, note).await?),
            None => None,
        };

        let commit = TransitionCommit::from_plan(&service, plan, notification, request.idempotency_key);
        bounded(self.store_timeout, self.store.commit_transition(&commit)).await?;

        tracing::info!(
            %service_id,
            %technician_id,
            from = %commit.from,
            to = %commit.to,
            "Service transitioned"
        );

        service.status = commit.to;
        if commit.technician_note.is_some() {
            service.technician_note = commit.technician_note.clone();
        }
        service.last_transition_key = commit.idempotency_key;
        service.updated_at = self.clock.now();

        self.announce(
            ChangeEvent::new(topics::SERVICES, names::SERVICES_UPDATED)
                .with_payload(json!({ "service_id": service_id, "status": commit.to }))
                .to_others(Some(technician_id)),
        )
        .await;
        self.rebroadcast_appointments(appointment.client_id, Some(technician_id));

        Ok(TransitionOutcome {
            service,
            replayed: false,
        })
    }

    async fn zero_price_notification(
        &self,
        service: &Service,
        appointment: &Appointment,
        note: &str,
    ) -> RepairResult<NewNotification> {
        let technician = bounded(
            self.store_timeout,
            self.store.get_technician(service.technician_id),
        )
        .await?
        .ok_or_else(|| {
            RepairError::NotFound(format!(
                "Technician with ID {} not found",
                service.technician_id
            ))
        })?;
        let client = bounded(self.store_timeout, self.store.get_client(appointment.client_id))
            .await?
            .ok_or_else(|| {
                RepairError::NotFound(format!("Client with ID {} not found", appointment.client_id))
            })?;

        Ok(NewNotification::zero_price_note(
            &technician.name,
            &client.full_name(),
            note,
        ))
    }

    /// Creates an undecided booking for an existing client.
    pub async fn book(&self, new: NewAppointment, actor: Option<Uuid>) -> RepairResult<Appointment> {
        new.validate(self.clock.now())?;

        bounded(self.store_timeout, self.store.get_client(new.client_id))
            .await?
            .ok_or_else(|| RepairError::NotFound(format!("Client with ID {} not found", new.client_id)))?;

        let appointment = bounded(self.store_timeout, self.store.create_appointment(new)).await?;
        tracing::info!(appointment_id = %appointment.id, client_id = %appointment.client_id, "Appointment booked");

        self.rebroadcast_appointments(appointment.client_id, actor);
        Ok(appointment)
    }

    /// Accepts a booking and assigns it to a technician, creating its service.
    pub async fn accept(
        &self,
        appointment_id: Uuid,
        technician_id: Uuid,
        actor: Option<Uuid>,
    ) -> RepairResult<Service> {
        let _guard = self.locks.acquire(appointment_id).await;

        let appointment = self.load_appointment(appointment_id).await?;
        if appointment.mark_as != MarkAs::None {
            return Err(RepairError::AlreadyDecided(appointment.mark_as));
        }

        bounded(self.store_timeout, self.store.get_technician(technician_id))
            .await?
            .ok_or_else(|| {
                RepairError::NotFound(format!("Technician with ID {} not found", technician_id))
            })?;

        let service = bounded(
            self.store_timeout,
            self.store.accept_appointment(appointment_id, technician_id),
        )
        .await?;
        tracing::info!(%appointment_id, service_id = %service.id, %technician_id, "Appointment accepted");

        self.announce(
            ChangeEvent::new(topics::SERVICES, names::SERVICES_UPDATED)
                .with_payload(json!({ "service_id": service.id, "status": service.status }))
                .to_others(actor),
        )
        .await;
        self.rebroadcast_appointments(appointment.client_id, actor);

        Ok(service)
    }

    pub async fn decline(
        &self,
        appointment_id: Uuid,
        actor: Option<Uuid>,
    ) -> RepairResult<Appointment> {
        let _guard = self.locks.acquire(appointment_id).await;

        let appointment = self.load_appointment(appointment_id).await?;
        if appointment.mark_as != MarkAs::None {
            return Err(RepairError::AlreadyDecided(appointment.mark_as));
        }

        let update = AppointmentUpdate {
            mark_as: Some(MarkAs::Declined),
            ..Default::default()
        };
        let appointment = bounded(
            self.store_timeout,
            self.store.update_appointment(appointment_id, update),
        )
        .await?;
        tracing::info!(%appointment_id, "Appointment declined");

        self.rebroadcast_appointments(appointment.client_id, actor);
        Ok(appointment)
    }

    pub async fn stage(&self, appointment_id: Uuid) -> RepairResult<(Appointment, AppointmentStage)> {
        let appointment = self.load_appointment(appointment_id).await?;
        let service = bounded(
            self.store_timeout,
            self.store.get_service_by_appointment(appointment_id),
        )
        .await?;

        let stage = AppointmentStage::resolve(&appointment, service)?;
        Ok((appointment, stage))
    }

    /// The technician's open work: everything not completed or canceled.
    pub async fn active_services(&self, technician_id: Uuid) -> RepairResult<Vec<Service>> {
        bounded(self.store_timeout, self.store.get_technician(technician_id))
            .await?
            .ok_or_else(|| {
                RepairError::NotFound(format!("Technician with ID {} not found", technician_id))
            })?;

        bounded(
            self.store_timeout,
            self.store.list_active_services(technician_id),
        )
        .await
    }

    async fn load_appointment(&self, appointment_id: Uuid) -> RepairResult<Appointment> {
        bounded(self.store_timeout, self.store.get_appointment(appointment_id))
            .await?
            .ok_or_else(|| {
                RepairError::NotFound(format!("Appointment with ID {} not found", appointment_id))
            })
    }

    async fn announce(&self, event: ChangeEvent) {
        let (topic, name) = (event.topic.clone(), event.name.clone());
        if let Err(e) = self.broadcaster.publish(event).await {
            tracing::warn!(%topic, %name, error = %e, "Failed to broadcast change");
        }
    }

    fn rebroadcast_appointments(&self, client_id: Uuid, actor: Option<Uuid>) {
        let job = Job::RebroadcastAppointments { client_id, actor };
        if let EnqueueOutcome::Overlapping = self.jobs.enqueue(job) {
            tracing::debug!(%client_id, "Appointment rebroadcast already queued");
        }
    }
}
