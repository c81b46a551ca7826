use crate::models::{DbAppointment, DbService};
use chrono::Utc;
use eyre::Result;
use repairdesk_core::models::{
    appointment::{AppointmentUpdate, MarkAs, NewAppointment},
    service::ServiceStatus,
};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const APPOINTMENT_COLUMNS: &str = "id, client_id, item, service_type, service_location, description, \
     schedule_at, status, mark_as, fix_price, price, warranty_receipt, created_at, updated_at";

pub async fn create_appointment(
    pool: &Pool<Postgres>,
    new: &NewAppointment,
) -> Result<DbAppointment> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(appointment_id = %id, client_id = %new.client_id, "Creating appointment");

    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        INSERT INTO appointments (id, client_id, item, service_type, service_location, description,
                                  schedule_at, status, mark_as, fix_price, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(new.client_id)
    .bind(&new.item)
    .bind(new.service_type.as_str())
    .bind(new.service_location.as_str())
    .bind(&new.description)
    .bind(new.schedule_at)
    .bind(ServiceStatus::Pending.as_str())
    .bind(MarkAs::None.as_str())
    .bind(new.fix_price.unwrap_or(Decimal::ZERO))
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(appointment)
}

pub async fn get_appointment_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbAppointment>> {
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(appointment)
}

pub async fn get_appointments_by_client_id(
    pool: &Pool<Postgres>,
    client_id: Uuid,
) -> Result<Vec<DbAppointment>> {
    let appointments = sqlx::query_as::<_, DbAppointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE client_id = $1 ORDER BY schedule_at ASC"
    ))
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    Ok(appointments)
}

pub async fn update_appointment(
    pool: &Pool<Postgres>,
    id: Uuid,
    update: &AppointmentUpdate,
) -> Result<Option<DbAppointment>> {
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        UPDATE appointments
        SET mark_as = COALESCE($2, mark_as),
            fix_price = COALESCE($3, fix_price),
            warranty_receipt = COALESCE($4, warranty_receipt),
            updated_at = $5
        WHERE id = $1
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(update.mark_as.map(|mark_as| mark_as.as_str()))
    .bind(update.fix_price)
    .bind(update.warranty_receipt.as_deref())
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    Ok(appointment)
}

pub enum AcceptOutcome {
    Accepted(DbService),
    NotFound,
    AlreadyDecided(String),
}

/// Flips `mark_as` to accepted and inserts the appointment's service in one
/// transaction. The row lock keeps two staff members from both accepting.
pub async fn accept_appointment(
    pool: &Pool<Postgres>,
    appointment_id: Uuid,
    technician_id: Uuid,
) -> Result<AcceptOutcome> {
    let mut tx = pool.begin().await?;

    let mark_as = sqlx::query_scalar::<_, String>(
        r#"
        SELECT mark_as FROM appointments WHERE id = $1 FOR UPDATE
        "#,
    )
    .bind(appointment_id)
    .fetch_optional(&mut *tx)
    .await?;

    match mark_as.as_deref() {
        None => return Ok(AcceptOutcome::NotFound),
        Some(current) if current != MarkAs::None.as_str() => {
            return Ok(AcceptOutcome::AlreadyDecided(current.to_string()));
        }
        Some(_) => {}
    }

    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE appointments SET mark_as = $2, updated_at = $3 WHERE id = $1
        "#,
    )
    .bind(appointment_id)
    .bind(MarkAs::Accepted.as_str())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let service = sqlx::query_as::<_, DbService>(
        r#"
        INSERT INTO services (id, appointment_id, technician_id, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        RETURNING id, appointment_id, technician_id, warranty, warranty_status, status,
                  technician_note, last_transition_key, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(appointment_id)
    .bind(technician_id)
    .bind(ServiceStatus::Pending.as_str())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(AcceptOutcome::Accepted(service))
}
