use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/services/:id/transition",
            post(handlers::services::transition_service),
        )
        .route(
            "/api/technicians/:id/services",
            get(handlers::services::list_active_services),
        )
}
