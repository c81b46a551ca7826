//! # Service Handlers
//!
//! Technician-facing work order endpoints: moving a job along its lifecycle
//! and listing the jobs still open.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use repairdesk_core::{
    errors::RepairError,
    lifecycle::TransitionRequest,
    models::service::{Service, ServiceStatus},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{
        actor::{Actor, ActorRole},
        error_handling::AppError,
    },
};

/// Body of a transition request. `status` is the target status.
#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub status: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<Uuid>,
}

impl TryFrom<TransitionBody> for TransitionRequest {
    type Error = RepairError;

    fn try_from(body: TransitionBody) -> Result<Self, Self::Error> {
        let target: ServiceStatus = body.status.trim().parse()?;
        Ok(TransitionRequest {
            target,
            price: body.price,
            note: body.note,
            idempotency_key: body.idempotency_key,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub ok: bool,
    pub replayed: bool,
    pub service: Service,
}

/// Moves a service to a new status. The caller must be the assigned technician.
///
/// # Endpoint
///
/// ```text
/// POST /api/services/:id/transition
/// {"status": "completed", "price": "0", "note": "Warranty repair"}
/// ```
///
/// # Errors
///
/// * `400` - Unknown status, missing price, or a free job without a note
/// * `403` - The service belongs to another technician
/// * `409` - The service cannot move to that status from where it is
/// * `503` - The store failed; nothing was applied and the call may be retried
#[axum::debug_handler]
pub async fn transition_service(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<TransitionResponse>, AppError> {
    actor.require(&[ActorRole::Technician])?;
    let request = TransitionRequest::try_from(body)?;

    let outcome = state.lifecycle.transition(id, actor.id, request).await?;
    Ok(Json(TransitionResponse {
        ok: true,
        replayed: outcome.replayed,
        service: outcome.service,
    }))
}

/// Services assigned to a technician that are not completed or canceled.
#[axum::debug_handler]
pub async fn list_active_services(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(technician_id): Path<Uuid>,
) -> Result<Json<Vec<Service>>, AppError> {
    actor.require_self_or(technician_id, &[ActorRole::Admin, ActorRole::Staff])?;

    let services = state.lifecycle.active_services(technician_id).await?;
    Ok(Json(services))
}
