use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use repairdesk_core::{
    errors::{RepairError, RepairResult},
    models::{
        appointment::{
            Appointment, AppointmentUpdate, MarkAs, NewAppointment, ServiceLocation, ServiceType,
        },
        client::{Client, ClientStatus},
        notification::{NewNotification, Notification, NotificationStatus},
        service::{Service, ServiceStatus, ServiceUpdate},
        technician::{
            AvailabilityChange, AvailabilitySource, Technician, TechnicianStatus, TechnicianUpdate,
            User, UserRole,
        },
    },
    store::{EntityStore, TransitionCommit},
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    clients: HashMap<Uuid, Client>,
    appointments: HashMap<Uuid, Appointment>,
    services: HashMap<Uuid, Service>,
    notifications: Vec<Notification>,
    availability_log: Vec<AvailabilityChange>,
}

impl State {
    fn technician(&self, id: Uuid) -> Option<Technician> {
        self.users
            .get(&id)
            .cloned()
            .and_then(|user| Technician::try_from(user).ok())
    }

    fn has_services(&self, user_id: Uuid) -> bool {
        self.services
            .values()
            .any(|service| service.technician_id == user_id)
    }

    fn apply_technician_update(&mut self, id: Uuid, update: &TechnicianUpdate) -> Option<Technician> {
        let user = self
            .users
            .get_mut(&id)
            .filter(|user| user.role == UserRole::Technician)?;

        if let Some(status) = update.status {
            user.status = Some(status);
        }
        if let Some(date) = update.scheduled_unavailable_date {
            user.scheduled_unavailable_date = date;
        }
        let technician = Technician::try_from(user.clone()).ok()?;

        if let Some(status) = update.status {
            self.availability_log.push(AvailabilityChange {
                technician_id: id,
                status,
                source: update.source,
                changed_at: Utc::now(),
            });
        }
        Some(technician)
    }
}

/// In-memory [`EntityStore`]. Every operation takes one lock, so each call
/// (including `commit_transition`) is atomic with respect to the others.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Seeding helpers

    pub fn insert_user(&self, user: User) -> User {
        self.lock().users.insert(user.id, user.clone());
        user
    }

    pub fn add_user(&self, name: &str, role: UserRole) -> User {
        self.insert_user(User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@repairdesk.test", name.to_lowercase().replace(' ', ".")),
            role,
            status: (role == UserRole::Technician).then_some(TechnicianStatus::Available),
            scheduled_unavailable_date: None,
            created_at: Utc::now(),
        })
    }

    pub fn add_technician(&self, name: &str) -> Technician {
        let user = self.add_user(name, UserRole::Technician);
        Technician::try_from(user).expect("seeded user is a technician")
    }

    pub fn add_client(&self, first_name: &str, last_name: &str) -> Client {
        let client = Client {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: None,
            phone: None,
            client_status: ClientStatus::Guest,
            created_at: Utc::now(),
        };
        self.lock().clients.insert(client.id, client.clone());
        client
    }

    /// An undecided booking for tomorrow.
    pub fn add_appointment(&self, client_id: Uuid) -> Appointment {
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            client_id,
            item: "Laptop".to_string(),
            service_type: ServiceType::HardwareRepair,
            service_location: ServiceLocation::InStore,
            description: "Screen flickers".to_string(),
            schedule_at: now + Duration::days(1),
            status: ServiceStatus::Pending,
            mark_as: MarkAs::None,
            fix_price: Decimal::ZERO,
            price: None,
            warranty_receipt: None,
            created_at: now,
            updated_at: now,
        };
        self.lock()
            .appointments
            .insert(appointment.id, appointment.clone());
        appointment
    }

    /// An accepted appointment with its pending service assigned to `technician_id`.
    pub fn add_service(&self, client_id: Uuid, technician_id: Uuid) -> Service {
        let appointment = self.add_appointment(client_id);
        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            technician_id,
            warranty: None,
            warranty_status: None,
            status: ServiceStatus::Pending,
            technician_note: None,
            last_transition_key: None,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.lock();
        if let Some(appointment) = state.appointments.get_mut(&appointment.id) {
            appointment.mark_as = MarkAs::Accepted;
        }
        state.services.insert(service.id, service.clone());
        service
    }

    pub fn set_user_schedule(&self, id: Uuid, date: Option<NaiveDate>) {
        if let Some(user) = self.lock().users.get_mut(&id) {
            user.scheduled_unavailable_date = date;
        }
    }

    pub fn set_technician_status(&self, id: Uuid, status: TechnicianStatus) {
        if let Some(user) = self.lock().users.get_mut(&id) {
            user.status = Some(status);
        }
    }

    // Inspection helpers

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.lock().users.get(&id).cloned()
    }

    pub fn technician(&self, id: Uuid) -> Option<Technician> {
        self.lock().technician(id)
    }

    pub fn service(&self, id: Uuid) -> Option<Service> {
        self.lock().services.get(&id).cloned()
    }

    pub fn appointment(&self, id: Uuid) -> Option<Appointment> {
        self.lock().appointments.get(&id).cloned()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    pub fn services_for_appointment(&self, appointment_id: Uuid) -> Vec<Service> {
        self.lock()
            .services
            .values()
            .filter(|service| service.appointment_id == appointment_id)
            .cloned()
            .collect()
    }
}

fn not_found(kind: &str, id: Uuid) -> RepairError {
    RepairError::NotFound(format!("{kind} with ID {id} not found"))
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_service(&self, id: Uuid) -> RepairResult<Option<Service>> {
        Ok(self.service(id))
    }

    async fn get_service_by_appointment(
        &self,
        appointment_id: Uuid,
    ) -> RepairResult<Option<Service>> {
        Ok(self.services_for_appointment(appointment_id).into_iter().next())
    }

    async fn update_service(&self, id: Uuid, update: ServiceUpdate) -> RepairResult<Service> {
        let mut state = self.lock();
        let service = state
            .services
            .get_mut(&id)
            .ok_or_else(|| not_found("Service", id))?;

        if update.warranty.is_some() {
            service.warranty = update.warranty;
        }
        if update.warranty_status.is_some() {
            service.warranty_status = update.warranty_status;
        }
        if update.technician_note.is_some() {
            service.technician_note = update.technician_note;
        }
        service.updated_at = Utc::now();
        Ok(service.clone())
    }

    async fn list_active_services(&self, technician_id: Uuid) -> RepairResult<Vec<Service>> {
        let mut services: Vec<Service> = self
            .lock()
            .services
            .values()
            .filter(|service| service.technician_id == technician_id && service.is_active())
            .cloned()
            .collect();
        services.sort_by_key(|service| service.created_at);
        Ok(services)
    }

    async fn get_appointment(&self, id: Uuid) -> RepairResult<Option<Appointment>> {
        Ok(self.appointment(id))
    }

    async fn create_appointment(&self, new: NewAppointment) -> RepairResult<Appointment> {
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            client_id: new.client_id,
            item: new.item,
            service_type: new.service_type,
            service_location: new.service_location,
            description: new.description,
            schedule_at: new.schedule_at,
            status: ServiceStatus::Pending,
            mark_as: MarkAs::None,
            fix_price: new.fix_price.unwrap_or(Decimal::ZERO),
            price: None,
            warranty_receipt: None,
            created_at: now,
            updated_at: now,
        };
        self.lock()
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        update: AppointmentUpdate,
    ) -> RepairResult<Appointment> {
        let mut state = self.lock();
        let appointment = state
            .appointments
            .get_mut(&id)
            .ok_or_else(|| not_found("Appointment", id))?;

        if let Some(mark_as) = update.mark_as {
            appointment.mark_as = mark_as;
        }
        if let Some(fix_price) = update.fix_price {
            appointment.fix_price = fix_price;
        }
        if update.warranty_receipt.is_some() {
            appointment.warranty_receipt = update.warranty_receipt;
        }
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn list_client_appointments(&self, client_id: Uuid) -> RepairResult<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self
            .lock()
            .appointments
            .values()
            .filter(|appointment| appointment.client_id == client_id)
            .cloned()
            .collect();
        appointments.sort_by_key(|appointment| appointment.schedule_at);
        Ok(appointments)
    }

    async fn accept_appointment(
        &self,
        appointment_id: Uuid,
        technician_id: Uuid,
    ) -> RepairResult<Service> {
        let mut state = self.lock();
        let appointment = state
            .appointments
            .get_mut(&appointment_id)
            .ok_or_else(|| not_found("Appointment", appointment_id))?;
        if appointment.mark_as != MarkAs::None {
            return Err(RepairError::AlreadyDecided(appointment.mark_as));
        }

        let now = Utc::now();
        appointment.mark_as = MarkAs::Accepted;
        appointment.updated_at = now;

        let service = Service {
            id: Uuid::new_v4(),
            appointment_id,
            technician_id,
            warranty: None,
            warranty_status: None,
            status: ServiceStatus::Pending,
            technician_note: None,
            last_transition_key: None,
            created_at: now,
            updated_at: now,
        };
        state.services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn get_client(&self, id: Uuid) -> RepairResult<Option<Client>> {
        Ok(self.lock().clients.get(&id).cloned())
    }

    async fn get_user(&self, id: Uuid) -> RepairResult<Option<User>> {
        Ok(self.user(id))
    }

    async fn get_technician(&self, id: Uuid) -> RepairResult<Option<Technician>> {
        Ok(self.technician(id))
    }

    async fn update_technician(
        &self,
        id: Uuid,
        update: TechnicianUpdate,
    ) -> RepairResult<Technician> {
        self.lock()
            .apply_technician_update(id, &update)
            .ok_or_else(|| not_found("Technician", id))
    }

    async fn apply_due_schedule(
        &self,
        id: Uuid,
        today: NaiveDate,
    ) -> RepairResult<Option<Technician>> {
        let mut state = self.lock();
        let still_due = state.users.get(&id).is_some_and(|user| {
            user.role == UserRole::Technician
                && user.scheduled_unavailable_date == Some(today)
                && user.status != Some(TechnicianStatus::Unavailable)
        });
        if !still_due {
            return Ok(None);
        }
        Ok(state.apply_technician_update(id, &TechnicianUpdate::sweep()))
    }

    async fn find_technicians_scheduled_today(
        &self,
        today: NaiveDate,
    ) -> RepairResult<Vec<Technician>> {
        let state = self.lock();
        let mut technicians: Vec<Technician> = state
            .users
            .values()
            .filter(|user| user.role == UserRole::Technician)
            .filter(|user| user.scheduled_unavailable_date == Some(today))
            .filter(|user| user.status != Some(TechnicianStatus::Unavailable))
            .filter_map(|user| Technician::try_from(user.clone()).ok())
            .collect();
        technicians.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(technicians)
    }

    async fn availability_history(
        &self,
        technician_id: Uuid,
    ) -> RepairResult<Vec<AvailabilityChange>> {
        Ok(self
            .lock()
            .availability_log
            .iter()
            .rev()
            .filter(|change| change.technician_id == technician_id)
            .cloned()
            .collect())
    }

    async fn create_notification(&self, new: NewNotification) -> RepairResult<Notification> {
        let now = Utc::now();
        let notification = Notification {
            id: Uuid::new_v4(),
            kind: new.kind,
            title: new.title,
            message: new.message,
            status: NotificationStatus::Unseen,
            created_at: now,
            updated_at: now,
        };
        self.lock().notifications.push(notification.clone());
        Ok(notification)
    }

    async fn commit_transition(&self, commit: &TransitionCommit) -> RepairResult<()> {
        let mut state = self.lock();

        // Check everything first so a failure leaves no partial writes.
        let current = state
            .services
            .get(&commit.service_id)
            .map(|service| service.status)
            .ok_or_else(|| not_found("Service", commit.service_id))?;
        if current != commit.from {
            return Err(RepairError::InvalidTransition {
                from: current,
                to: commit.to,
            });
        }
        if !state.appointments.contains_key(&commit.appointment_id) {
            return Err(not_found("Appointment", commit.appointment_id));
        }
        if commit.technician_status.is_some() && state.technician(commit.technician_id).is_none() {
            return Err(not_found("Technician", commit.technician_id));
        }

        let now = Utc::now();
        if let Some(service) = state.services.get_mut(&commit.service_id) {
            service.status = commit.to;
            if commit.technician_note.is_some() {
                service.technician_note = commit.technician_note.clone();
            }
            service.last_transition_key = commit.idempotency_key;
            service.updated_at = now;
        }
        if let Some(appointment) = state.appointments.get_mut(&commit.appointment_id) {
            appointment.status = commit.to;
            if commit.price.is_some() {
                appointment.price = commit.price;
            }
            appointment.updated_at = now;
        }
        if let Some(status) = commit.technician_status {
            let update = TechnicianUpdate::status(
                status,
                AvailabilitySource::Lifecycle,
            );
            state.apply_technician_update(commit.technician_id, &update);
        }
        if let Some(new) = &commit.notification {
            state.notifications.push(Notification {
                id: Uuid::new_v4(),
                kind: new.kind,
                title: new.title.clone(),
                message: new.message.clone(),
                status: NotificationStatus::Unseen,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(())
    }

    async fn user_has_services(&self, id: Uuid) -> RepairResult<bool> {
        Ok(self.lock().has_services(id))
    }

    async fn delete_user(&self, id: Uuid) -> RepairResult<bool> {
        let mut state = self.lock();
        if state.has_services(id) {
            return Err(RepairError::Conflict(format!(
                "user {id} still has assigned services"
            )));
        }
        Ok(state.users.remove(&id).is_some())
    }
}
