use std::sync::Arc;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use repairdesk_core::{
    errors::RepairError,
    events::{names, topics},
    lifecycle::TransitionRequest,
    models::{
        client::Client,
        notification::NotificationKind,
        service::{Service, ServiceStatus},
        technician::{Technician, TechnicianStatus},
    },
    store::EntityStore,
};
use repairdesk_db::mock::MockStore;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::{TestContext, as_actor, server_over, settle};

fn seed(ctx: &TestContext) -> (Technician, Client, Service) {
    let tech = ctx.store.add_technician("Tess Tech");
    let client = ctx.store.add_client("Ana", "Lim");
    let service = ctx.store.add_service(client.id, tech.id);
    (tech, client, service)
}

async fn transition(ctx: &TestContext, service: &Service, tech: Uuid, body: Value) -> (StatusCode, Value) {
    let response = as_actor(
        ctx.server
            .post(&format!("/api/services/{}/transition", service.id)),
        tech,
        "technician",
    )
    .json(&body)
    .await;
    (response.status_code(), response.json::<Value>())
}

#[tokio::test]
async fn start_then_complete_with_a_price() {
    let ctx = TestContext::new();
    let (tech, _, service) = seed(&ctx);

    let (status, body) = transition(&ctx, &service, tech.id, json!({ "status": "in-progress" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["service"]["status"], "in-progress");
    assert_eq!(ctx.store.technician(tech.id).unwrap().status, TechnicianStatus::Unavailable);

    let (status, _) = transition(
        &ctx,
        &service,
        tech.id,
        json!({ "status": "completed", "price": "150" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(ctx.store.service(service.id).unwrap().status, ServiceStatus::Completed);
    let appointment = ctx.store.appointment(service.appointment_id).unwrap();
    assert_eq!(appointment.price, Some(Decimal::from(150)));
    assert_eq!(appointment.status, ServiceStatus::Completed);
    assert_eq!(ctx.store.technician(tech.id).unwrap().status, TechnicianStatus::Available);
    assert!(ctx.store.notifications().is_empty());
}

#[tokio::test]
async fn free_completion_without_note_is_rejected_and_changes_nothing() {
    let ctx = TestContext::new();
    let (tech, _, service) = seed(&ctx);
    transition(&ctx, &service, tech.id, json!({ "status": "in-progress" })).await;

    let (status, body) = transition(
        &ctx,
        &service,
        tech.id,
        json!({ "status": "completed", "price": "0", "note": "   " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("note"));
    assert_eq!(ctx.store.service(service.id).unwrap().status, ServiceStatus::InProgress);
    assert_eq!(ctx.store.technician(tech.id).unwrap().status, TechnicianStatus::Unavailable);
    assert!(ctx.store.notifications().is_empty());
}

#[tokio::test]
async fn free_completion_with_note_notifies_admins_and_broadcasts() {
    let ctx = TestContext::new();
    let (tech, client, service) = seed(&ctx);
    transition(&ctx, &service, tech.id, json!({ "status": "in-progress" })).await;

    let mut own_tab = ctx.state.hub.subscribe(Some(tech.id), vec![topics::SERVICES.to_string()]);
    let mut admin_tab = ctx.state.hub.subscribe(Some(Uuid::new_v4()), vec![topics::SERVICES.to_string()]);

    let (status, _) = transition(
        &ctx,
        &service,
        tech.id,
        json!({ "status": "completed", "price": "0", "note": "Warranty repair" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(ctx.store.technician(tech.id).unwrap().status, TechnicianStatus::Available);
    let notifications = ctx.store.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::ZeroPriceNote);
    assert!(notifications[0].message.contains(&client.full_name()));
    assert!(notifications[0].message.contains("Tess Tech"));
    assert!(notifications[0].message.contains("Warranty repair"));

    assert!(own_tab.try_recv().is_none());
    let event = admin_tab.try_recv().unwrap();
    assert_eq!(event.name, names::SERVICES_UPDATED);
    assert_eq!(event.payload["status"], "completed");
}

#[tokio::test]
async fn cancelling_in_progress_work_leaves_availability_alone() {
    let ctx = TestContext::new();
    let (tech, _, service) = seed(&ctx);
    transition(&ctx, &service, tech.id, json!({ "status": "in-progress" })).await;

    let (status, _) = transition(&ctx, &service, tech.id, json!({ "status": "canceled" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.store.service(service.id).unwrap().status, ServiceStatus::Canceled);
    assert_eq!(ctx.store.technician(tech.id).unwrap().status, TechnicianStatus::Unavailable);
}

#[tokio::test]
async fn illegal_edges_conflict_and_leave_state_unchanged() {
    let ctx = TestContext::new();
    let (tech, _, service) = seed(&ctx);

    let (status, _) = transition(
        &ctx,
        &service,
        tech.id,
        json!({ "status": "completed", "price": "80" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    transition(&ctx, &service, tech.id, json!({ "status": "canceled" })).await;
    let (status, body) = transition(&ctx, &service, tech.id, json!({ "status": "in-progress" })).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("canceled"));
    assert_eq!(ctx.store.service(service.id).unwrap().status, ServiceStatus::Canceled);
    assert_eq!(ctx.store.technician(tech.id).unwrap().status, TechnicianStatus::Available);
}

#[tokio::test]
async fn unknown_status_and_pending_target_are_validation_errors() {
    let ctx = TestContext::new();
    let (tech, _, service) = seed(&ctx);

    let (status, _) = transition(&ctx, &service, tech.id, json!({ "status": "done" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = transition(&ctx, &service, tech.id, json!({ "status": "pending" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_assigned_technician_may_transition() {
    let ctx = TestContext::new();
    let (_, _, service) = seed(&ctx);
    let other = ctx.store.add_technician("Otto Other");

    let (status, _) = transition(&ctx, &service, other.id, json!({ "status": "in-progress" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let response = as_actor(
        ctx.server.post(&format!("/api/services/{}/transition", service.id)),
        Uuid::new_v4(),
        "staff",
    )
    .json(&json!({ "status": "in-progress" }))
    .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(ctx.store.service(service.id).unwrap().status, ServiceStatus::Pending);
}

#[tokio::test]
async fn missing_service_is_not_found() {
    let ctx = TestContext::new();
    let response = as_actor(
        ctx.server
            .post(&format!("/api/services/{}/transition", Uuid::new_v4())),
        Uuid::new_v4(),
        "technician",
    )
    .json(&json!({ "status": "in-progress" }))
    .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn retried_request_with_the_same_key_is_not_applied_twice() {
    let ctx = TestContext::new();
    let (tech, _, service) = seed(&ctx);
    let key = Uuid::new_v4();
    let mut tab = ctx.state.hub.subscribe(None, vec![topics::SERVICES.to_string()]);

    let body = json!({ "status": "in-progress", "idempotency_key": key });
    let (_, first) = transition(&ctx, &service, tech.id, body.clone()).await;
    let (status, second) = transition(&ctx, &service, tech.id, body).await;

    assert_eq!(first["replayed"], false);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["replayed"], true);
    assert!(tab.try_recv().is_some());
    assert!(tab.try_recv().is_none());
    let history = ctx.store.availability_history(tech.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn transition_rebroadcasts_the_client_appointments() {
    let ctx = TestContext::new();
    let (tech, client, service) = seed(&ctx);
    let mut client_tab = ctx
        .state
        .hub
        .subscribe(None, vec![topics::client_appointments(client.id)]);

    transition(&ctx, &service, tech.id, json!({ "status": "in-progress" })).await;
    settle().await;

    let event = client_tab.try_recv().unwrap();
    assert_eq!(event.name, names::APPOINTMENTS_UPDATED);
    assert_eq!(event.exclude_actor, Some(tech.id));
}

#[test_log::test(tokio::test)]
async fn concurrent_complete_and_cancel_cannot_both_win() {
    let ctx = TestContext::new();
    let (tech, _, service) = seed(&ctx);
    transition(&ctx, &service, tech.id, json!({ "status": "in-progress" })).await;

    let lifecycle = |request: TransitionRequest| {
        let state = ctx.state.clone();
        let (service_id, tech_id) = (service.id, tech.id);
        tokio::spawn(async move { state.lifecycle.transition(service_id, tech_id, request).await })
    };
    let complete = lifecycle(TransitionRequest::complete(Decimal::from(90)));
    let cancel = lifecycle(TransitionRequest::cancel());

    let results = [complete.await.unwrap(), cancel.await.unwrap()];
    let wins = results.iter().filter(|result| result.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|result| matches!(result, Err(RepairError::InvalidTransition { .. })))
        .count();

    assert_eq!((wins, conflicts), (1, 1));
    assert!(ctx.store.service(service.id).unwrap().status.is_terminal());
}

#[test_log::test(tokio::test)]
async fn store_failure_applies_nothing_and_broadcasts_nothing() {
    let service = Service {
        id: Uuid::new_v4(),
        appointment_id: Uuid::new_v4(),
        technician_id: Uuid::new_v4(),
        warranty: None,
        warranty_status: None,
        status: ServiceStatus::InProgress,
        technician_note: None,
        last_transition_key: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let appointment = {
        let scratch = repairdesk_db::mock::MemoryStore::new();
        let client = scratch.add_client("Ana", "Lim");
        repairdesk_core::models::appointment::Appointment {
            id: service.appointment_id,
            ..scratch.add_appointment(client.id)
        }
    };

    let mut store = MockStore::new();
    let found = service.clone();
    store
        .expect_get_service()
        .returning(move |_| Ok(Some(found.clone())));
    store
        .expect_get_appointment()
        .returning(move |_| Ok(Some(appointment.clone())));
    store
        .expect_commit_transition()
        .times(1)
        .returning(|_| Err(RepairError::StoreUnavailable(eyre::eyre!("connection reset"))));
    store.expect_list_client_appointments().never();

    let (state, server) = server_over(Arc::new(store));
    let mut tab = state.hub.subscribe(None, vec![]);

    let response = as_actor(
        server.post(&format!("/api/services/{}/transition", service.id)),
        service.technician_id,
        "technician",
    )
    .json(&json!({ "status": "completed", "price": "120" }))
    .await;
    settle().await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response.json::<Value>();
    assert!(!body["error"].as_str().unwrap().contains("connection reset"));
    assert!(tab.try_recv().is_none());
}

#[tokio::test]
async fn technician_work_list_excludes_closed_services() {
    let ctx = TestContext::new();
    let (tech, client, open) = seed(&ctx);
    let closed = ctx.store.add_service(client.id, tech.id);
    transition(&ctx, &closed, tech.id, json!({ "status": "canceled" })).await;

    let response = as_actor(
        ctx.server.get(&format!("/api/technicians/{}/services", tech.id)),
        tech.id,
        "technician",
    )
    .await;
    let services = response.json::<Vec<Service>>();

    assert_eq!(services.len(), 1);
    assert_eq!(services[0].id, open.id);

    let forbidden = as_actor(
        ctx.server.get(&format!("/api/technicians/{}/services", tech.id)),
        Uuid::new_v4(),
        "technician",
    )
    .await;
    assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
}
