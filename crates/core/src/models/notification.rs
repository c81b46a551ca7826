use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum NotificationKind {
        /// A technician closed a job at no charge and explained why.
        ZeroPriceNote => "zero_price_note",
    }
}

text_enum! {
    pub enum NotificationStatus {
        Unseen => "unseen",
        Read => "read",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl NewNotification {
    pub fn zero_price_note(technician_name: &str, client_name: &str, note: &str) -> Self {
        Self {
            kind: NotificationKind::ZeroPriceNote,
            title: "Service completed at no charge".to_string(),
            message: format!(
                "{technician_name} completed the service for {client_name} with a price of 0. Note: {note}"
            ),
        }
    }
}
