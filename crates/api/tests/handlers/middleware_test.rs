use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};
use pretty_assertions::assert_eq;
use repairdesk_api::middleware::{actor::ACTOR_ROLE_HEADER, error_handling::AppError};
use repairdesk_core::{
    errors::RepairError,
    models::{appointment::MarkAs, service::ServiceStatus},
};
use rstest::rstest;
use serde_json::Value;
use uuid::Uuid;

use crate::test_utils::{TestContext, as_actor};

#[rstest]
#[case(RepairError::NotFound("gone".into()), StatusCode::NOT_FOUND)]
#[case(RepairError::Validation("bad".into()), StatusCode::BAD_REQUEST)]
#[case(RepairError::InvalidDate("too soon".into()), StatusCode::BAD_REQUEST)]
#[case(
    RepairError::InvalidTransition { from: ServiceStatus::Completed, to: ServiceStatus::Canceled },
    StatusCode::CONFLICT
)]
#[case(RepairError::AlreadyDecided(MarkAs::Declined), StatusCode::CONFLICT)]
#[case(RepairError::Conflict("still assigned".into()), StatusCode::CONFLICT)]
#[case(RepairError::Authentication("who".into()), StatusCode::UNAUTHORIZED)]
#[case(RepairError::Authorization("no".into()), StatusCode::FORBIDDEN)]
#[case(
    RepairError::StoreUnavailable(eyre::eyre!("pool timed out")),
    StatusCode::SERVICE_UNAVAILABLE
)]
#[case(RepairError::Internal("broken invariant".into()), StatusCode::INTERNAL_SERVER_ERROR)]
fn errors_map_to_status_codes(#[case] error: RepairError, #[case] expected: StatusCode) {
    assert_eq!(AppError(error).status(), expected);
}

async fn body_of(error: RepairError) -> (StatusCode, Value) {
    let response = AppError(error).into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn caller_errors_carry_their_message() {
    let (status, body) = body_of(RepairError::InvalidDate(
        "2025-12-01 must be after today (2025-12-01)".into(),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid date: 2025-12-01 must be after today (2025-12-01)"
    );
}

#[tokio::test]
async fn server_errors_hide_their_cause() {
    let (status, body) = body_of(RepairError::StoreUnavailable(eyre::eyre!(
        "password authentication failed for user repairdesk"
    )))
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!body["error"].as_str().unwrap().contains("password"));

    let (status, body) = body_of(RepairError::Internal("row 42 is corrupt".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn eyre_reports_become_store_failures() {
    let error = AppError::from(eyre::eyre!("connection refused"));
    assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn protected_routes_require_an_actor() {
    let ctx = TestContext::new();
    let path = format!("/api/technicians/{}/availability", Uuid::new_v4());

    let anonymous = ctx.server.get(&path).await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let half = ctx
        .server
        .get(&path)
        .add_header(
            HeaderName::from_static(ACTOR_ROLE_HEADER),
            HeaderValue::from_static("admin"),
        )
        .await;
    assert_eq!(half.status_code(), StatusCode::UNAUTHORIZED);

    let unknown_role = as_actor(ctx.server.get(&path), Uuid::new_v4(), "owner").await;
    assert_eq!(unknown_role.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_booking_is_allowed_but_half_headers_are_not() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/appointments")
        .add_header(
            HeaderName::from_static(ACTOR_ROLE_HEADER),
            HeaderValue::from_static("client"),
        )
        .json(&serde_json::json!({}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_and_version_are_public() {
    let ctx = TestContext::new();

    let health = ctx.server.get("/health").await.json::<Value>();
    assert_eq!(health["status"], "ok");

    let version = ctx.server.get("/version").await.json::<Value>();
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}
