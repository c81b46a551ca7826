use crate::models::DbNotification;
use chrono::Utc;
use eyre::Result;
use repairdesk_core::models::notification::{NewNotification, NotificationStatus};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

pub async fn create_notification(
    pool: &Pool<Postgres>,
    new: &NewNotification,
) -> Result<DbNotification> {
    let mut conn = pool.acquire().await?;
    insert_notification(&mut conn, new).await
}

/// Inserts on an existing connection so the lifecycle commit can include it
/// in its transaction.
pub async fn insert_notification(
    conn: &mut PgConnection,
    new: &NewNotification,
) -> Result<DbNotification> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let notification = sqlx::query_as::<_, DbNotification>(
        r#"
        INSERT INTO notifications (id, type, title, message, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING id, type, title, message, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(new.kind.as_str())
    .bind(&new.title)
    .bind(&new.message)
    .bind(NotificationStatus::Unseen.as_str())
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(notification_id = %id, kind = %new.kind, "Notification created");
    Ok(notification)
}
