//! # Appointment Handlers
//!
//! Booking and staff triage. A booking starts undecided; staff either decline
//! it or accept it and assign a technician, which creates its service.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use repairdesk_core::models::{
    appointment::{Appointment, AppointmentStage, NewAppointment},
    service::Service,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{
        actor::{Actor, ActorRole, MaybeActor},
        error_handling::AppError,
    },
};

#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub triage: AppointmentStage,
}

#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    pub technician_id: Uuid,
}

/// Books a new appointment for an existing client.
///
/// # Endpoint
///
/// ```text
/// POST /api/appointments
/// ```
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<ApiState>>,
    actor: MaybeActor,
    Json(request): Json<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let appointment = state.lifecycle.book(request, actor.id()).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Returns an appointment together with its triage stage (and service, once accepted).
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<ApiState>>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let (appointment, triage) = state.lifecycle.stage(id).await?;
    Ok(Json(AppointmentResponse {
        appointment,
        triage,
    }))
}

#[axum::debug_handler]
pub async fn accept_appointment(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<AcceptRequest>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    actor.require(&[ActorRole::Admin, ActorRole::Staff])?;

    let service = state
        .lifecycle
        .accept(id, request.technician_id, Some(actor.id))
        .await?;
    Ok((StatusCode::CREATED, Json(service)))
}

#[axum::debug_handler]
pub async fn decline_appointment(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    actor.require(&[ActorRole::Admin, ActorRole::Staff])?;

    let appointment = state.lifecycle.decline(id, Some(actor.id)).await?;
    Ok(Json(appointment))
}
