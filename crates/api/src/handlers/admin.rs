use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use repairdesk_worker::SweepReport;
use serde::Deserialize;

use crate::{
    ApiState,
    middleware::{
        actor::{Actor, ActorRole},
        error_handling::AppError,
    },
};

#[derive(Debug, Deserialize)]
pub struct SweepQuery {
    /// Defaults to the shop's current day.
    pub today: Option<NaiveDate>,
}

/// Runs the scheduled-unavailability sweep on demand.
#[axum::debug_handler]
pub async fn run_sweep(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Query(query): Query<SweepQuery>,
) -> Result<Json<SweepReport>, AppError> {
    actor.require(&[ActorRole::Admin])?;

    let today = query.today.unwrap_or_else(|| state.clock.today());
    let report = state.sweeper.run(today).await?;
    Ok(Json(report))
}
