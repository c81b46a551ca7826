use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use repairdesk_core::{
    events::{names, topics},
    models::technician::{TechnicianStatus, UserRole},
};
use repairdesk_worker::SweepReport;
use serde_json::Value;
use uuid::Uuid;

use crate::test_utils::{TestContext, as_actor, day, settle};

#[tokio::test]
async fn sweep_marks_due_technicians_once() {
    let ctx = TestContext::new();
    let due = ctx.store.add_technician("Dana Due");
    let later = ctx.store.add_technician("Lee Later");
    ctx.store.set_user_schedule(due.id, Some(day(2025, 12, 1)));
    ctx.store.set_user_schedule(later.id, Some(day(2025, 12, 2)));
    let admin = Uuid::new_v4();

    let report = as_actor(ctx.server.post("/api/admin/sweep"), admin, "admin")
        .add_query_param("today", "2025-12-01")
        .await
        .json::<Value>();
    assert_eq!(report["updated_count"], 1);
    assert_eq!(report["failed_count"], 0);

    assert_eq!(ctx.store.technician(due.id).unwrap().status, TechnicianStatus::Unavailable);
    assert_eq!(ctx.store.technician(later.id).unwrap().status, TechnicianStatus::Available);

    let report = as_actor(ctx.server.post("/api/admin/sweep"), admin, "admin")
        .add_query_param("today", "2025-12-01")
        .await
        .json::<Value>();
    assert_eq!(report["updated_count"], 0);
}

#[tokio::test]
async fn sweep_defaults_to_the_shop_day() {
    let ctx = TestContext::new();
    let due = ctx.store.add_technician("Dana Due");
    ctx.store.set_user_schedule(due.id, Some(day(2025, 11, 20)));

    let response = as_actor(ctx.server.post("/api/admin/sweep"), Uuid::new_v4(), "admin").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let report = response.json::<SweepReport>();
    assert_eq!(report.updated_count, 1);
}

#[tokio::test]
async fn sweep_is_admin_only() {
    let ctx = TestContext::new();
    let due = ctx.store.add_technician("Dana Due");
    ctx.store.set_user_schedule(due.id, Some(day(2025, 11, 20)));

    let response = as_actor(ctx.server.post("/api/admin/sweep"), Uuid::new_v4(), "staff").await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(ctx.store.technician(due.id).unwrap().status, TechnicianStatus::Available);
}

#[tokio::test]
async fn deleting_a_user_is_queued_and_announced_to_others() {
    let ctx = TestContext::new();
    let doomed = ctx.store.add_user("Sam Staff", UserRole::Staff);
    let admin = Uuid::new_v4();
    let mut admin_tab = ctx.state.hub.subscribe(Some(admin), vec![topics::USERS.to_string()]);
    let mut other_tab = ctx
        .state
        .hub
        .subscribe(Some(Uuid::new_v4()), vec![topics::USERS.to_string()]);

    let response = as_actor(
        ctx.server.delete(&format!("/api/users/{}", doomed.id)),
        admin,
        "admin",
    )
    .await;

    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "queued");

    settle().await;
    assert!(ctx.store.user(doomed.id).is_none());
    assert!(admin_tab.try_recv().is_none());
    let event = other_tab.try_recv().unwrap();
    assert_eq!(event.name, names::USER_DELETED);
    assert_eq!(event.payload["user_id"], serde_json::json!(doomed.id));
}

#[tokio::test]
async fn deleting_requires_admin_and_an_existing_user() {
    let ctx = TestContext::new();
    let target = ctx.store.add_user("Sam Staff", UserRole::Staff);

    let response = as_actor(
        ctx.server.delete(&format!("/api/users/{}", target.id)),
        Uuid::new_v4(),
        "staff",
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = as_actor(
        ctx.server.delete(&format!("/api/users/{}", Uuid::new_v4())),
        Uuid::new_v4(),
        "admin",
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    settle().await;
    assert!(ctx.store.user(target.id).is_some());
}

#[tokio::test]
async fn technicians_with_services_cannot_be_deleted() {
    let ctx = TestContext::new();
    let tech = ctx.store.add_technician("Tess Tech");
    let client = ctx.store.add_client("Ana", "Lim");
    let service = ctx.store.add_service(client.id, tech.id);

    let response = as_actor(
        ctx.server.delete(&format!("/api/users/{}", tech.id)),
        Uuid::new_v4(),
        "admin",
    )
    .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    settle().await;
    assert!(ctx.store.user(tech.id).is_some());
    assert!(ctx.store.service(service.id).is_some());
}
