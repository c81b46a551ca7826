use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::mock;
use repairdesk_core::{
    errors::RepairResult,
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

// Mock store for testing failure paths
mock! {
    pub Store {}

    #[async_trait]
    impl EntityStore for Store {
        async fn get_service(&self, id: Uuid) -> RepairResult<Option<Service>>;

        async fn get_service_by_appointment(
            &self,
            appointment_id: Uuid,
        ) -> RepairResult<Option<Service>>;

        async fn update_service(&self, id: Uuid, update: ServiceUpdate) -> RepairResult<Service>;

        async fn list_active_services(&self, technician_id: Uuid) -> RepairResult<Vec<Service>>;

        async fn get_appointment(&self, id: Uuid) -> RepairResult<Option<Appointment>>;

        async fn create_appointment(&self, new: NewAppointment) -> RepairResult<Appointment>;

        async fn update_appointment(
            &self,
            id: Uuid,
            update: AppointmentUpdate,
        ) -> RepairResult<Appointment>;

        async fn list_client_appointments(&self, client_id: Uuid) -> RepairResult<Vec<Appointment>>;

        async fn accept_appointment(
            &self,
            appointment_id: Uuid,
            technician_id: Uuid,
        ) -> RepairResult<Service>;

        async fn get_client(&self, id: Uuid) -> RepairResult<Option<Client>>;

        async fn get_user(&self, id: Uuid) -> RepairResult<Option<User>>;

        async fn get_technician(&self, id: Uuid) -> RepairResult<Option<Technician>>;

        async fn update_technician(
            &self,
            id: Uuid,
            update: TechnicianUpdate,
        ) -> RepairResult<Technician>;

        async fn apply_due_schedule(
            &self,
            id: Uuid,
            today: NaiveDate,
        ) -> RepairResult<Option<Technician>>;

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

        async fn user_has_services(&self, id: Uuid) -> RepairResult<bool>;

        async fn delete_user(&self, id: Uuid) -> RepairResult<bool>;
    }
}
