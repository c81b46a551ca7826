//! # Availability Handlers
//!
//! Reading and setting a technician's availability, scheduling a future day
//! off, and the log of who changed the status.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::NaiveDate;
use repairdesk_core::{
    errors::RepairError,
    models::technician::{Availability, AvailabilityChange, TechnicianStatus},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{
        actor::{Actor, ActorRole},
        error_handling::AppError,
    },
};

#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    /// `available` or `unavailable`
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    /// `null` clears the schedule
    pub date: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    _actor: Actor,
    Path(technician_id): Path<Uuid>,
) -> Result<Json<Availability>, AppError> {
    let availability = state.availability.get_availability(technician_id).await?;
    Ok(Json(availability))
}

#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(technician_id): Path<Uuid>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Availability>, AppError> {
    actor.require_self_or(technician_id, &[ActorRole::Admin])?;

    let status: TechnicianStatus = request
        .status
        .trim()
        .parse()
        .map_err(RepairError::from)?;
    let technician = state
        .availability
        .set_availability(technician_id, status)
        .await?;
    Ok(Json(Availability::from(&technician)))
}

/// Schedules the first day a technician is unavailable.
///
/// # Endpoint
///
/// ```text
/// PUT /api/technicians/:id/availability/schedule
/// {"date": "2025-12-01"}
/// ```
///
/// The date must be after the shop's current day, otherwise `400` with an
/// invalid date error. `{"date": null}` clears the schedule.
#[axum::debug_handler]
pub async fn schedule_unavailable(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(technician_id): Path<Uuid>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<Availability>, AppError> {
    actor.require_self_or(technician_id, &[ActorRole::Admin])?;

    let technician = state
        .availability
        .schedule_unavailable_from(technician_id, request.date)
        .await?;
    Ok(Json(Availability::from(&technician)))
}

#[axum::debug_handler]
pub async fn availability_history(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(technician_id): Path<Uuid>,
) -> Result<Json<Vec<AvailabilityChange>>, AppError> {
    actor.require(&[ActorRole::Admin, ActorRole::Staff])?;

    let history = state.availability.availability_history(technician_id).await?;
    Ok(Json(history))
}
