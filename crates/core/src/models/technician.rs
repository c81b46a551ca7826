use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::RepairError;

text_enum! {
    pub enum UserRole {
        Admin => "admin",
        Staff => "staff",
        Technician => "technician",
    }
}

text_enum! {
    pub enum TechnicianStatus {
        Available => "available",
        Unavailable => "unavailable",
    }
}

text_enum! {
    /// Which writer last set a technician's status.
    pub enum AvailabilitySource {
        Manual => "manual",
        Lifecycle => "lifecycle",
        Sweep => "sweep",
    }
}

/// A row of the shared `users` table. Only technicians carry availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub status: Option<TechnicianStatus>,
    pub scheduled_unavailable_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technician {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: TechnicianStatus,
    pub scheduled_unavailable_date: Option<NaiveDate>,
}

impl TryFrom<User> for Technician {
    type Error = RepairError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        if user.role != UserRole::Technician {
            return Err(RepairError::NotFound(format!(
                "Technician with ID {} not found",
                user.id
            )));
        }

        Ok(Technician {
            id: user.id,
            name: user.name,
            email: user.email,
            status: user.status.unwrap_or(TechnicianStatus::Available),
            scheduled_unavailable_date: user.scheduled_unavailable_date,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub status: TechnicianStatus,
    pub scheduled_unavailable_date: Option<NaiveDate>,
}

impl From<&Technician> for Availability {
    fn from(technician: &Technician) -> Self {
        Availability {
            status: technician.status,
            scheduled_unavailable_date: technician.scheduled_unavailable_date,
        }
    }
}

/// A write against a technician row. Every availability writer (manual
/// toggle, lifecycle side effect, sweep) goes through this one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianUpdate {
    pub status: Option<TechnicianStatus>,
    /// `Some(None)` clears the schedule, `None` leaves it untouched.
    pub scheduled_unavailable_date: Option<Option<NaiveDate>>,
    pub source: AvailabilitySource,
}

impl TechnicianUpdate {
    pub fn status(status: TechnicianStatus, source: AvailabilitySource) -> Self {
        Self {
            status: Some(status),
            scheduled_unavailable_date: None,
            source,
        }
    }

    pub fn schedule(date: Option<NaiveDate>) -> Self {
        Self {
            status: None,
            scheduled_unavailable_date: Some(date),
            source: AvailabilitySource::Manual,
        }
    }

    /// Applies a due schedule: unavailable from today, schedule cleared.
    pub fn sweep() -> Self {
        Self {
            status: Some(TechnicianStatus::Unavailable),
            scheduled_unavailable_date: Some(None),
            source: AvailabilitySource::Sweep,
        }
    }
}

/// One entry of the availability log kept alongside the status column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityChange {
    pub technician_id: Uuid,
    pub status: TechnicianStatus,
    pub source: AvailabilitySource,
    pub changed_at: DateTime<Utc>,
}
