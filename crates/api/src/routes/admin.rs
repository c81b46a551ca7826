use axum::{
    Router,
    routing::{delete, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/users/:id", delete(handlers::users::delete_user))
        .route("/api/admin/sweep", post(handlers::admin::run_sweep))
}
