use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{RepairError, RepairResult};
use crate::models::service::{Service, ServiceStatus};

text_enum! {
    pub enum ServiceType {
        HardwareRepair => "hardware-repair",
        SoftwareSolution => "software-solution",
        Maintenance => "maintenance",
    }
}

text_enum! {
    pub enum ServiceLocation {
        InStore => "in-store",
        HomeService => "home-service",
    }
}

text_enum! {
    /// Staff triage decision on a booking.
    pub enum MarkAs {
        None => "none",
        Accepted => "accepted",
        Declined => "declined",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub item: String,
    pub service_type: ServiceType,
    pub service_location: ServiceLocation,
    pub description: String,
    pub schedule_at: DateTime<Utc>,
    pub status: ServiceStatus,
    pub mark_as: MarkAs,
    pub fix_price: Decimal,
    pub price: Option<Decimal>,
    pub warranty_receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub client_id: Uuid,
    pub item: String,
    pub service_type: ServiceType,
    pub service_location: ServiceLocation,
    #[serde(default)]
    pub description: String,
    pub schedule_at: DateTime<Utc>,
    #[serde(default)]
    pub fix_price: Option<Decimal>,
}

/// Amounts are stored as NUMERIC(12,2): at most two decimal places and
/// 9,999,999,999.99 in magnitude. Trailing zeros are ignored.
pub fn check_amount(field: &str, amount: Decimal) -> RepairResult<()> {
    if amount.normalize().scale() > 2 {
        return Err(RepairError::Validation(format!(
            "{field} must have at most 2 decimal places"
        )));
    }
    if amount.abs() > Decimal::new(999_999_999_999, 2) {
        return Err(RepairError::Validation(format!(
            "{field} must not exceed 9999999999.99"
        )));
    }
    Ok(())
}

impl NewAppointment {
    /// Checks the booking form before anything touches the store.
    pub fn validate(&self, now: DateTime<Utc>) -> RepairResult<()> {
        if self.item.trim().is_empty() {
            return Err(RepairError::Validation("item is required".to_string()));
        }
        if self.schedule_at <= now {
            return Err(RepairError::Validation(
                "schedule_at must be in the future".to_string(),
            ));
        }
        if let Some(fix_price) = self.fix_price {
            if fix_price.is_sign_negative() {
                return Err(RepairError::Validation(
                    "fix_price must not be negative".to_string(),
                ));
            }
            check_amount("fix_price", fix_price)?;
        }
        Ok(())
    }
}

/// Fields staff or the lifecycle may change on an appointment. `None` leaves a
/// column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentUpdate {
    pub mark_as: Option<MarkAs>,
    pub fix_price: Option<Decimal>,
    pub warranty_receipt: Option<String>,
}

/// Where a booking stands in triage. A work order exists only once accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "service", rename_all = "snake_case")]
pub enum AppointmentStage {
    Pending,
    Accepted(Service),
    Declined,
}

impl AppointmentStage {
    /// Builds the stage from the stored `mark_as` and the (optional) service
    /// row. Rows that break "accepted ⇔ one service" are reported as internal
    /// faults rather than papered over.
    pub fn resolve(appointment: &Appointment, service: Option<Service>) -> RepairResult<Self> {
        match (appointment.mark_as, service) {
            (MarkAs::Accepted, Some(service)) => Ok(AppointmentStage::Accepted(service)),
            (MarkAs::None, None) => Ok(AppointmentStage::Pending),
            (MarkAs::Declined, None) => Ok(AppointmentStage::Declined),
            (MarkAs::Accepted, None) => Err(RepairError::Internal(
                format!("appointment {} is accepted but has no service", appointment.id).into(),
            )),
            (mark_as, Some(service)) => Err(RepairError::Internal(
                format!(
                    "appointment {} is {} but has service {}",
                    appointment.id, mark_as, service.id
                )
                .into(),
            )),
        }
    }

    pub fn service(&self) -> Option<&Service> {
        match self {
            AppointmentStage::Accepted(service) => Some(service),
            _ => None,
        }
    }
}
