use crate::models::{DbAvailabilityChange, DbUser};
use chrono::{NaiveDate, Utc};
use eyre::Result;
use repairdesk_core::models::technician::{
    AvailabilitySource, TechnicianStatus, TechnicianUpdate, UserRole,
};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

pub async fn get_user_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, name, email, role, status, scheduled_unavailable_date, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_technician_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, name, email, role, status, scheduled_unavailable_date, created_at
        FROM users
        WHERE id = $1 AND role = $2
        "#,
    )
    .bind(id)
    .bind(UserRole::Technician.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Applies `update` to a technician row and logs the status change in the
/// same transaction. Returns `None` when no technician has that id.
pub async fn update_technician(
    pool: &Pool<Postgres>,
    id: Uuid,
    update: &TechnicianUpdate,
) -> Result<Option<DbUser>> {
    let mut tx = pool.begin().await?;
    let user = update_technician_on(&mut tx, id, update).await?;
    tx.commit().await?;

    Ok(user)
}

pub async fn update_technician_on(
    conn: &mut PgConnection,
    id: Uuid,
    update: &TechnicianUpdate,
) -> Result<Option<DbUser>> {
    let touch_schedule = update.scheduled_unavailable_date.is_some();
    let scheduled_date = update.scheduled_unavailable_date.flatten();

    let user = sqlx::query_as::<_, DbUser>(
        r#"
        UPDATE users
        SET status = COALESCE($3, status),
            scheduled_unavailable_date = CASE WHEN $4 THEN $5 ELSE scheduled_unavailable_date END
        WHERE id = $1 AND role = $2
        RETURNING id, name, email, role, status, scheduled_unavailable_date, created_at
        "#,
    )
    .bind(id)
    .bind(UserRole::Technician.as_str())
    .bind(update.status.map(|status| status.as_str()))
    .bind(touch_schedule)
    .bind(scheduled_date)
    .fetch_optional(&mut *conn)
    .await?;

    if let (Some(_), Some(status)) = (&user, update.status) {
        record_availability_change(conn, id, status, update.source).await?;
    }

    Ok(user)
}

/// The sweep's write. The `WHERE` repeats the selection so a technician who
/// rescheduled or changed status since the sweep read them is left alone.
pub async fn apply_due_schedule(
    pool: &Pool<Postgres>,
    id: Uuid,
    today: NaiveDate,
) -> Result<Option<DbUser>> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, DbUser>(
        r#"
        UPDATE users
        SET status = $3, scheduled_unavailable_date = NULL
        WHERE id = $1
          AND role = $2
          AND scheduled_unavailable_date = $4
          AND status IS DISTINCT FROM $3
        RETURNING id, name, email, role, status, scheduled_unavailable_date, created_at
        "#,
    )
    .bind(id)
    .bind(UserRole::Technician.as_str())
    .bind(TechnicianStatus::Unavailable.as_str())
    .bind(today)
    .fetch_optional(&mut *tx)
    .await?;

    if user.is_some() {
        record_availability_change(
            &mut tx,
            id,
            TechnicianStatus::Unavailable,
            AvailabilitySource::Sweep,
        )
        .await?;
    }
    tx.commit().await?;

    Ok(user)
}

async fn record_availability_change(
    conn: &mut PgConnection,
    technician_id: Uuid,
    status: TechnicianStatus,
    source: AvailabilitySource,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO availability_changes (id, technician_id, status, source, changed_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(technician_id)
    .bind(status.as_str())
    .bind(source.as_str())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn find_technicians_scheduled_on(
    pool: &Pool<Postgres>,
    date: NaiveDate,
) -> Result<Vec<DbUser>> {
    let users = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, name, email, role, status, scheduled_unavailable_date, created_at
        FROM users
        WHERE role = $1
          AND scheduled_unavailable_date = $2
          AND (status IS NULL OR status <> $3)
        ORDER BY name ASC
        "#,
    )
    .bind(UserRole::Technician.as_str())
    .bind(date)
    .bind(TechnicianStatus::Unavailable.as_str())
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn get_availability_changes(
    pool: &Pool<Postgres>,
    technician_id: Uuid,
) -> Result<Vec<DbAvailabilityChange>> {
    let changes = sqlx::query_as::<_, DbAvailabilityChange>(
        r#"
        SELECT id, technician_id, status, source, changed_at
        FROM availability_changes
        WHERE technician_id = $1
        ORDER BY changed_at DESC
        "#,
    )
    .bind(technician_id)
    .fetch_all(pool)
    .await?;

    Ok(changes)
}

pub async fn has_services(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let (assigned,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (SELECT 1 FROM services WHERE technician_id = $1)
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(assigned)
}

/// Deletes the user unless a service still references them. Returns `false`
/// both for a missing user and for one that was kept.
pub async fn delete_user(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM users
        WHERE id = $1
          AND NOT EXISTS (SELECT 1 FROM services WHERE technician_id = $1)
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
