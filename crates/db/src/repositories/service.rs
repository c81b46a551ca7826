use crate::models::DbService;
use crate::repositories::{notification, user};
use chrono::Utc;
use eyre::Result;
use repairdesk_core::models::{
    service::{ServiceStatus, ServiceUpdate},
    technician::{AvailabilitySource, TechnicianUpdate},
};
use repairdesk_core::store::TransitionCommit;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const SERVICE_COLUMNS: &str = "id, appointment_id, technician_id, warranty, warranty_status, status, \
     technician_note, last_transition_key, created_at, updated_at";

pub async fn get_service_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbService>> {
    let service = sqlx::query_as::<_, DbService>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

pub async fn get_service_by_appointment_id(
    pool: &Pool<Postgres>,
    appointment_id: Uuid,
) -> Result<Option<DbService>> {
    let service = sqlx::query_as::<_, DbService>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE appointment_id = $1"
    ))
    .bind(appointment_id)
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

pub async fn get_active_services_by_technician_id(
    pool: &Pool<Postgres>,
    technician_id: Uuid,
) -> Result<Vec<DbService>> {
    let services = sqlx::query_as::<_, DbService>(&format!(
        r#"
        SELECT {SERVICE_COLUMNS}
        FROM services
        WHERE technician_id = $1 AND status NOT IN ($2, $3)
        ORDER BY created_at ASC
        "#
    ))
    .bind(technician_id)
    .bind(ServiceStatus::Completed.as_str())
    .bind(ServiceStatus::Canceled.as_str())
    .fetch_all(pool)
    .await?;

    Ok(services)
}

pub async fn update_service(
    pool: &Pool<Postgres>,
    id: Uuid,
    update: &ServiceUpdate,
) -> Result<Option<DbService>> {
    let service = sqlx::query_as::<_, DbService>(&format!(
        r#"
        UPDATE services
        SET warranty = COALESCE($2, warranty),
            warranty_status = COALESCE($3, warranty_status),
            technician_note = COALESCE($4, technician_note),
            updated_at = $5
        WHERE id = $1
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(update.warranty.as_deref())
    .bind(update.warranty_status.as_deref())
    .bind(update.technician_note.as_deref())
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

/// Applies every write of one lifecycle transition in a single transaction.
///
/// The service update is a compare-and-set on `commit.from`; if another
/// writer moved the service first nothing is written and `false` is returned.
pub async fn commit_transition(pool: &Pool<Postgres>, commit: &TransitionCommit) -> Result<bool> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let moved = sqlx::query(
        r#"
        UPDATE services
        SET status = $3,
            technician_note = COALESCE($4, technician_note),
            last_transition_key = $5,
            updated_at = $6
        WHERE id = $1 AND status = $2
        "#,
    )
    .bind(commit.service_id)
    .bind(commit.from.as_str())
    .bind(commit.to.as_str())
    .bind(commit.technician_note.as_deref())
    .bind(commit.idempotency_key)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if moved.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        r#"
        UPDATE appointments
        SET status = $2, price = COALESCE($3, price), updated_at = $4
        WHERE id = $1
        "#,
    )
    .bind(commit.appointment_id)
    .bind(commit.to.as_str())
    .bind(commit.price)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if let Some(status) = commit.technician_status {
        let update = TechnicianUpdate::status(status, AvailabilitySource::Lifecycle);
        let updated = user::update_technician_on(&mut tx, commit.technician_id, &update).await?;
        if updated.is_none() {
            tx.rollback().await?;
            eyre::bail!("technician {} vanished during transition", commit.technician_id);
        }
    }

    if let Some(new) = &commit.notification {
        notification::insert_notification(&mut tx, new).await?;
    }

    tx.commit().await?;
    Ok(true)
}
