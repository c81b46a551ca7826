use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    /// Progress of a work order. `Completed` and `Canceled` are terminal.
    pub enum ServiceStatus {
        Pending => "pending",
        InProgress => "in-progress",
        Completed => "completed",
        Canceled => "canceled",
    }
}

impl ServiceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ServiceStatus::Completed | ServiceStatus::Canceled)
    }

    /// Legal edges: pending → in-progress → completed, and
    /// pending | in-progress → canceled.
    pub fn can_transition_to(self, to: ServiceStatus) -> bool {
        matches!(
            (self, to),
            (ServiceStatus::Pending, ServiceStatus::InProgress)
                | (ServiceStatus::InProgress, ServiceStatus::Completed)
                | (ServiceStatus::Pending, ServiceStatus::Canceled)
                | (ServiceStatus::InProgress, ServiceStatus::Canceled)
        )
    }
}

impl Default for ServiceStatus {
    fn default() -> Self {
        ServiceStatus::Pending
    }
}

/// Work order created when staff accept an appointment and assign a technician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub technician_id: Uuid,
    pub warranty: Option<String>,
    pub warranty_status: Option<String>,
    pub status: ServiceStatus,
    pub technician_note: Option<String>,
    /// Key of the last committed transition, used to recognise retries.
    pub last_transition_key: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Whether the service still shows up on the technician's work list.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceUpdate {
    pub warranty: Option<String>,
    pub warranty_status: Option<String>,
    pub technician_note: Option<String>,
}
