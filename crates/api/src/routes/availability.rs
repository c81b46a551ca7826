use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/technicians/:id/availability",
            get(handlers::availability::get_availability)
                .put(handlers::availability::set_availability),
        )
        .route(
            "/api/technicians/:id/availability/schedule",
            put(handlers::availability::schedule_unavailable),
        )
        .route(
            "/api/technicians/:id/availability/history",
            get(handlers::availability::availability_history),
        )
}
