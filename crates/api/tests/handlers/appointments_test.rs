use axum::http::StatusCode;
use fake::{
    Fake,
    faker::name::en::{FirstName, LastName},
};
use pretty_assertions::assert_eq;
use repairdesk_core::{
    events::{names, topics},
    models::{
        appointment::{Appointment, MarkAs},
        service::{Service, ServiceStatus},
    },
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::{TestContext, as_actor, settle};

fn booking(client_id: Uuid, schedule_at: &str) -> Value {
    json!({
        "client_id": client_id,
        "item": "iPhone 12",
        "service_type": "hardware-repair",
        "service_location": "in-store",
        "description": "Cracked screen",
        "schedule_at": schedule_at,
        "fix_price": "49.90",
    })
}

#[tokio::test]
async fn booking_a_future_slot_creates_an_undecided_appointment() {
    let ctx = TestContext::new();
    let (first, last): (String, String) = (FirstName().fake(), LastName().fake());
    let client = ctx.store.add_client(&first, &last);
    let mut client_tab = ctx
        .state
        .hub
        .subscribe(None, vec![topics::client_appointments(client.id)]);

    let response = ctx
        .server
        .post("/api/appointments")
        .json(&booking(client.id, "2025-11-22T09:30:00Z"))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let appointment = response.json::<Appointment>();
    assert_eq!(appointment.client_id, client.id);
    assert_eq!(appointment.mark_as, MarkAs::None);
    assert_eq!(appointment.status, ServiceStatus::Pending);
    assert!(ctx.store.services_for_appointment(appointment.id).is_empty());

    settle().await;
    let event = client_tab.try_recv().unwrap();
    assert_eq!(event.name, names::APPOINTMENTS_UPDATED);
}

#[tokio::test]
async fn booking_in_the_past_is_rejected() {
    let ctx = TestContext::new();
    let client = ctx.store.add_client("Ana", "Lim");

    let response = ctx
        .server
        .post("/api/appointments")
        .json(&booking(client.id, "2025-11-19T09:30:00Z"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_for_an_unknown_client_is_not_found() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/appointments")
        .json(&booking(Uuid::new_v4(), "2025-11-22T09:30:00Z"))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn accepting_assigns_a_technician_and_creates_one_service() {
    let ctx = TestContext::new();
    let tech = ctx.store.add_technician("Tess Tech");
    let client = ctx.store.add_client("Ana", "Lim");
    let appointment = ctx.store.add_appointment(client.id);
    let staff = Uuid::new_v4();

    let response = as_actor(
        ctx.server
            .post(&format!("/api/appointments/{}/accept", appointment.id)),
        staff,
        "staff",
    )
    .json(&json!({ "technician_id": tech.id }))
    .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let service = response.json::<Service>();
    assert_eq!(service.technician_id, tech.id);
    assert_eq!(service.status, ServiceStatus::Pending);
    assert_eq!(
        ctx.store.appointment(appointment.id).unwrap().mark_as,
        MarkAs::Accepted
    );
    assert_eq!(ctx.store.services_for_appointment(appointment.id).len(), 1);

    let again = as_actor(
        ctx.server
            .post(&format!("/api/appointments/{}/accept", appointment.id)),
        staff,
        "staff",
    )
    .json(&json!({ "technician_id": tech.id }))
    .await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);
    assert_eq!(ctx.store.services_for_appointment(appointment.id).len(), 1);
}

#[tokio::test]
async fn accepting_with_an_unknown_technician_changes_nothing() {
    let ctx = TestContext::new();
    let client = ctx.store.add_client("Ana", "Lim");
    let appointment = ctx.store.add_appointment(client.id);

    let response = as_actor(
        ctx.server
            .post(&format!("/api/appointments/{}/accept", appointment.id)),
        Uuid::new_v4(),
        "admin",
    )
    .json(&json!({ "technician_id": Uuid::new_v4() }))
    .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        ctx.store.appointment(appointment.id).unwrap().mark_as,
        MarkAs::None
    );
}

#[tokio::test]
async fn declined_appointments_cannot_be_accepted_later() {
    let ctx = TestContext::new();
    let tech = ctx.store.add_technician("Tess Tech");
    let client = ctx.store.add_client("Ana", "Lim");
    let appointment = ctx.store.add_appointment(client.id);
    let admin = Uuid::new_v4();

    let declined = as_actor(
        ctx.server
            .post(&format!("/api/appointments/{}/decline", appointment.id)),
        admin,
        "admin",
    )
    .await;
    assert_eq!(declined.status_code(), StatusCode::OK);
    assert_eq!(declined.json::<Appointment>().mark_as, MarkAs::Declined);

    let accepted = as_actor(
        ctx.server
            .post(&format!("/api/appointments/{}/accept", appointment.id)),
        admin,
        "admin",
    )
    .json(&json!({ "technician_id": tech.id }))
    .await;
    assert_eq!(accepted.status_code(), StatusCode::CONFLICT);
    assert!(ctx.store.services_for_appointment(appointment.id).is_empty());
}

#[tokio::test]
async fn only_staff_and_admins_triage() {
    let ctx = TestContext::new();
    let tech = ctx.store.add_technician("Tess Tech");
    let client = ctx.store.add_client("Ana", "Lim");
    let appointment = ctx.store.add_appointment(client.id);

    let response = as_actor(
        ctx.server
            .post(&format!("/api/appointments/{}/accept", appointment.id)),
        tech.id,
        "technician",
    )
    .json(&json!({ "technician_id": tech.id }))
    .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = as_actor(
        ctx.server
            .post(&format!("/api/appointments/{}/decline", appointment.id)),
        client.id,
        "client",
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        ctx.store.appointment(appointment.id).unwrap().mark_as,
        MarkAs::None
    );
}

#[tokio::test]
async fn appointment_view_reports_its_triage_stage() {
    let ctx = TestContext::new();
    let tech = ctx.store.add_technician("Tess Tech");
    let client = ctx.store.add_client("Ana", "Lim");
    let undecided = ctx.store.add_appointment(client.id);
    let service = ctx.store.add_service(client.id, tech.id);

    let body = as_actor(
        ctx.server
            .get(&format!("/api/appointments/{}", undecided.id)),
        tech.id,
        "technician",
    )
    .await
    .json::<Value>();
    assert_eq!(body["id"], json!(undecided.id));
    assert_eq!(body["triage"]["stage"], "pending");

    let body = as_actor(
        ctx.server
            .get(&format!("/api/appointments/{}", service.appointment_id)),
        tech.id,
        "technician",
    )
    .await
    .json::<Value>();
    assert_eq!(body["mark_as"], "accepted");
    assert_eq!(body["triage"]["stage"], "accepted");
    assert_eq!(body["triage"]["service"]["id"], json!(service.id));
}

#[tokio::test]
async fn appointment_view_requires_an_actor() {
    let ctx = TestContext::new();
    let client = ctx.store.add_client("Ana", "Lim");
    let appointment = ctx.store.add_appointment(client.id);

    let response = ctx
        .server
        .get(&format!("/api/appointments/{}", appointment.id))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let missing = as_actor(
        ctx.server.get(&format!("/api/appointments/{}", Uuid::new_v4())),
        Uuid::new_v4(),
        "staff",
    )
    .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}
