//! Background job kinds and the handler that runs them against the store.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use repairdesk_core::{
    errors::{RepairError, RepairResult},
    events::{Broadcaster, ChangeEvent, names, topics},
    store::EntityStore,
};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    DeleteUser,
    RebroadcastAppointments,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::DeleteUser => "delete-user",
            JobKind::RebroadcastAppointments => "rebroadcast-appointments",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of fire-and-forget work. `actor` is whoever triggered it; the
/// completion broadcast is sent to everyone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    DeleteUser {
        user_id: Uuid,
        actor: Option<Uuid>,
    },
    RebroadcastAppointments {
        client_id: Uuid,
        actor: Option<Uuid>,
    },
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Job::DeleteUser { .. } => JobKind::DeleteUser,
            Job::RebroadcastAppointments { .. } => JobKind::RebroadcastAppointments,
        }
    }

    /// The dedupe key within the job's kind.
    pub fn key(&self) -> Uuid {
        match self {
            Job::DeleteUser { user_id, .. } => *user_id,
            Job::RebroadcastAppointments { client_id, .. } => *client_id,
        }
    }

    pub fn actor(&self) -> Option<Uuid> {
        match self {
            Job::DeleteUser { actor, .. } | Job::RebroadcastAppointments { actor, .. } => *actor,
        }
    }

    /// Overlap is judged on `(kind, key)`.
    pub fn lease_key(&self) -> String {
        format!("{}:{}", self.kind(), self.key())
    }
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> RepairResult<()>;
}

/// Runs jobs against the entity store and announces them on the broadcaster.
pub struct StoreJobHandler {
    store: Arc<dyn EntityStore>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl StoreJobHandler {
    pub fn new(store: Arc<dyn EntityStore>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self { store, broadcaster }
    }

    async fn announce(&self, event: ChangeEvent) {
        let (topic, name) = (event.topic.clone(), event.name.clone());
        if let Err(e) = self.broadcaster.publish(event).await {
            tracing::warn!(%topic, %name, error = %e, "Failed to broadcast job completion");
        }
    }
}

#[async_trait]
impl JobHandler for StoreJobHandler {
    async fn handle(&self, job: &Job) -> RepairResult<()> {
        match *job {
            Job::DeleteUser { user_id, actor } => {
                if !self.store.delete_user(user_id).await? {
                    return Err(RepairError::NotFound(format!(
                        "User with ID {} not found",
                        user_id
                    )));
                }
                tracing::info!(%user_id, "Deleted user");

                self.announce(
                    ChangeEvent::new(topics::USERS, names::USER_DELETED)
                        .with_payload(json!({ "user_id": user_id }))
                        .to_others(actor),
                )
                .await;
            }
            Job::RebroadcastAppointments { client_id, actor } => {
                let appointments = self.store.list_client_appointments(client_id).await?;

                self.announce(
                    ChangeEvent::new(
                        topics::client_appointments(client_id),
                        names::APPOINTMENTS_UPDATED,
                    )
                    .with_payload(json!({ "appointments": appointments }))
                    .to_others(actor),
                )
                .await;
            }
        }
        Ok(())
    }
}
