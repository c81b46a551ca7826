//! Change notifications pushed to connected browser tabs.
//!
//! Events are refetch hints. Delivery is a single best-effort attempt per
//! publish, there is no ordering between publishes, and the payload is never
//! the record of truth.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod topics {
    use uuid::Uuid;

    pub const SERVICES: &str = "services";
    pub const USERS: &str = "users";

    pub fn client_appointments(client_id: Uuid) -> String {
        format!("clients.{client_id}.appointments")
    }
}

pub mod names {
    pub const SERVICES_UPDATED: &str = "ServicesUpdated";
    pub const USER_DELETED: &str = "UserDeleted";
    pub const APPOINTMENTS_UPDATED: &str = "AppointmentsUpdated";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub topic: String,
    pub name: String,
    pub payload: serde_json::Value,
    /// The actor whose own connections must not receive this event.
    pub exclude_actor: Option<Uuid>,
    pub published_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(topic: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            name: name.into(),
            payload: serde_json::Value::Object(Default::default()),
            exclude_actor: None,
            published_at: Utc::now(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Deliver to everyone except `actor` (no-op when there is no actor).
    pub fn to_others(mut self, actor: Option<Uuid>) -> Self {
        self.exclude_actor = actor;
        self
    }

    pub fn is_visible_to(&self, actor: Option<Uuid>) -> bool {
        match (self.exclude_actor, actor) {
            (Some(excluded), Some(actor)) => excluded != actor,
            _ => true,
        }
    }
}

#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// One delivery attempt. Callers log failures and carry on.
    async fn publish(&self, event: ChangeEvent) -> eyre::Result<()>;
}
