use chrono::{DateTime, NaiveDate, Utc};
use eyre::{Report, Result};
use repairdesk_core::models::{
    appointment::Appointment,
    client::Client,
    notification::Notification,
    service::Service,
    technician::{AvailabilityChange, TechnicianStatus, User},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: Option<String>,
    pub scheduled_unavailable_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbClient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub client_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub item: String,
    pub service_type: String,
    pub service_location: String,
    pub description: String,
    pub schedule_at: DateTime<Utc>,
    pub status: String,
    pub mark_as: String,
    pub fix_price: Decimal,
    pub price: Option<Decimal>,
    pub warranty_receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbService {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub technician_id: Uuid,
    pub warranty: Option<String>,
    pub warranty_status: Option<String>,
    pub status: String,
    pub technician_note: Option<String>,
    pub last_transition_key: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbNotification {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityChange {
    pub id: Uuid,
    pub technician_id: Uuid,
    pub status: String,
    pub source: String,
    pub changed_at: DateTime<Utc>,
}

// Rows hold text columns; unknown values mean the table was written by
// something else and are reported rather than defaulted.

impl TryFrom<DbUser> for User {
    type Error = Report;

    fn try_from(row: DbUser) -> Result<Self> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse()?,
            status: row
                .status
                .as_deref()
                .map(str::parse::<TechnicianStatus>)
                .transpose()?,
            scheduled_unavailable_date: row.scheduled_unavailable_date,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbClient> for Client {
    type Error = Report;

    fn try_from(row: DbClient) -> Result<Self> {
        Ok(Client {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            client_status: row.client_status.parse()?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbAppointment> for Appointment {
    type Error = Report;

    fn try_from(row: DbAppointment) -> Result<Self> {
        Ok(Appointment {
            id: row.id,
            client_id: row.client_id,
            item: row.item,
            service_type: row.service_type.parse()?,
            service_location: row.service_location.parse()?,
            description: row.description,
            schedule_at: row.schedule_at,
            status: row.status.parse()?,
            mark_as: row.mark_as.parse()?,
            fix_price: row.fix_price,
            price: row.price,
            warranty_receipt: row.warranty_receipt,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbService> for Service {
    type Error = Report;

    fn try_from(row: DbService) -> Result<Self> {
        Ok(Service {
            id: row.id,
            appointment_id: row.appointment_id,
            technician_id: row.technician_id,
            warranty: row.warranty,
            warranty_status: row.warranty_status,
            status: row.status.parse()?,
            technician_note: row.technician_note,
            last_transition_key: row.last_transition_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbNotification> for Notification {
    type Error = Report;

    fn try_from(row: DbNotification) -> Result<Self> {
        Ok(Notification {
            id: row.id,
            kind: row.kind.parse()?,
            title: row.title,
            message: row.message,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbAvailabilityChange> for AvailabilityChange {
    type Error = Report;

    fn try_from(row: DbAvailabilityChange) -> Result<Self> {
        Ok(AvailabilityChange {
            technician_id: row.technician_id,
            status: row.status.parse()?,
            source: row.source.parse()?,
            changed_at: row.changed_at,
        })
    }
}
