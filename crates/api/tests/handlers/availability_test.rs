use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use repairdesk_core::models::technician::{
    Availability, AvailabilityChange, AvailabilitySource, TechnicianStatus, UserRole,
};
use serde_json::json;
use uuid::Uuid;

use crate::test_utils::{TestContext, as_actor, day};

fn schedule_path(id: Uuid) -> String {
    format!("/api/technicians/{id}/availability/schedule")
}

#[tokio::test]
async fn scheduling_a_later_day_is_accepted() {
    let ctx = TestContext::new();
    let tech = ctx.store.add_technician("Tess Tech");

    let response = as_actor(ctx.server.put(&schedule_path(tech.id)), tech.id, "technician")
        .json(&json!({ "date": "2025-12-01" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let availability = response.json::<Availability>();
    assert_eq!(availability.scheduled_unavailable_date, Some(day(2025, 12, 1)));
    assert_eq!(availability.status, TechnicianStatus::Available);
}

#[tokio::test]
async fn scheduling_today_or_earlier_is_an_invalid_date() {
    let ctx = TestContext::on(day(2025, 12, 1));
    let tech = ctx.store.add_technician("Tess Tech");

    for date in ["2025-12-01", "2025-11-30"] {
        let response = as_actor(ctx.server.put(&schedule_path(tech.id)), tech.id, "technician")
            .json(&json!({ "date": date }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = response.json::<serde_json::Value>();
        assert!(body["error"].as_str().unwrap().contains("2025-12-01"));
    }
    assert_eq!(ctx.store.technician(tech.id).unwrap().scheduled_unavailable_date, None);
}

#[tokio::test]
async fn null_date_clears_the_schedule() {
    let ctx = TestContext::new();
    let tech = ctx.store.add_technician("Tess Tech");
    ctx.store.set_user_schedule(tech.id, Some(day(2025, 12, 1)));

    let response = as_actor(ctx.server.put(&schedule_path(tech.id)), Uuid::new_v4(), "admin")
        .json(&json!({ "date": null }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(ctx.store.technician(tech.id).unwrap().scheduled_unavailable_date, None);
}

#[tokio::test]
async fn other_technicians_cannot_change_a_schedule() {
    let ctx = TestContext::new();
    let tech = ctx.store.add_technician("Tess Tech");
    let other = ctx.store.add_technician("Otto Other");

    let response = as_actor(ctx.server.put(&schedule_path(tech.id)), other.id, "technician")
        .json(&json!({ "date": "2025-12-01" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn manual_toggle_is_logged_and_readable() {
    let ctx = TestContext::new();
    let tech = ctx.store.add_technician("Tess Tech");
    let path = format!("/api/technicians/{}/availability", tech.id);

    let response = as_actor(ctx.server.put(&path), tech.id, "technician")
        .json(&json!({ "status": "unavailable" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let availability = as_actor(ctx.server.get(&path), Uuid::new_v4(), "staff")
        .await
        .json::<Availability>();
    assert_eq!(availability.status, TechnicianStatus::Unavailable);

    let history = as_actor(
        ctx.server
            .get(&format!("/api/technicians/{}/availability/history", tech.id)),
        Uuid::new_v4(),
        "staff",
    )
    .await
    .json::<Vec<AvailabilityChange>>();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, TechnicianStatus::Unavailable);
    assert_eq!(history[0].source, AvailabilitySource::Manual);
}

#[tokio::test]
async fn unknown_status_value_is_rejected() {
    let ctx = TestContext::new();
    let tech = ctx.store.add_technician("Tess Tech");

    let response = as_actor(
        ctx.server
            .put(&format!("/api/technicians/{}/availability", tech.id)),
        tech.id,
        "technician",
    )
    .json(&json!({ "status": "on-holiday" }))
    .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        ctx.store.technician(tech.id).unwrap().status,
        TechnicianStatus::Available
    );
}

#[tokio::test]
async fn non_technicians_have_no_availability() {
    let ctx = TestContext::new();
    let staff = ctx.store.add_user("Sam Staff", UserRole::Staff);

    let response = as_actor(
        ctx.server
            .get(&format!("/api/technicians/{}/availability", staff.id)),
        Uuid::new_v4(),
        "admin",
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = as_actor(
        ctx.server
            .put(&format!("/api/technicians/{}/availability", staff.id)),
        Uuid::new_v4(),
        "admin",
    )
    .json(&json!({ "status": "unavailable" }))
    .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.store.user(staff.id).unwrap().status, None);
}
