use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use repairdesk_core::errors::RepairError;
use repairdesk_worker::{EnqueueOutcome, Job};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{
        actor::{Actor, ActorRole},
        error_handling::AppError,
    },
    services::bounded,
};

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub user_id: Uuid,
    /// `queued`, or `in_progress` when a deletion for this user is already running
    pub status: &'static str,
}

/// Queues a user deletion and returns before it runs. Users with services are
/// refused up front.
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<DeleteUserResponse>), AppError> {
    actor.require(&[ActorRole::Admin])?;

    bounded(state.store_timeout, state.store.get_user(user_id))
        .await?
        .ok_or_else(|| RepairError::NotFound(format!("User with ID {} not found", user_id)))?;
    if bounded(state.store_timeout, state.store.user_has_services(user_id)).await? {
        return Err(RepairError::Conflict(format!(
            "user {user_id} still has assigned services"
        ))
        .into());
    }

    let status = match state.jobs.enqueue(Job::DeleteUser {
        user_id,
        actor: Some(actor.id),
    }) {
        EnqueueOutcome::Started(_) => "queued",
        EnqueueOutcome::Overlapping => "in_progress",
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(DeleteUserResponse { user_id, status }),
    ))
}
