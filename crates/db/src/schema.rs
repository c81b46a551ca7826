use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Staff, admins and technicians share one table; only technicians use
    // the availability columns.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL UNIQUE,
            role VARCHAR(32) NOT NULL,
            status VARCHAR(32) NULL,
            scheduled_unavailable_date DATE NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_role CHECK (role IN ('admin', 'staff', 'technician')),
            CONSTRAINT valid_status CHECK (status IS NULL OR status IN ('available', 'unavailable'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            first_name VARCHAR(255) NOT NULL,
            last_name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NULL,
            phone VARCHAR(64) NULL,
            client_status VARCHAR(32) NOT NULL DEFAULT 'guest',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            client_id UUID NOT NULL REFERENCES clients(id),
            item VARCHAR(255) NOT NULL,
            service_type VARCHAR(32) NOT NULL,
            service_location VARCHAR(32) NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            schedule_at TIMESTAMP WITH TIME ZONE NOT NULL,
            status VARCHAR(32) NOT NULL DEFAULT 'pending',
            mark_as VARCHAR(32) NOT NULL DEFAULT 'none',
            fix_price NUMERIC(12, 2) NOT NULL DEFAULT 0,
            price NUMERIC(12, 2) NULL,
            warranty_receipt VARCHAR(512) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // One work order per appointment, created at acceptance.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            appointment_id UUID NOT NULL UNIQUE REFERENCES appointments(id),
            technician_id UUID NOT NULL REFERENCES users(id),
            warranty VARCHAR(255) NULL,
            warranty_status VARCHAR(64) NULL,
            status VARCHAR(32) NOT NULL DEFAULT 'pending',
            technician_note TEXT NULL,
            last_transition_key UUID NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_service_status
                CHECK (status IN ('pending', 'in-progress', 'completed', 'canceled'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            type VARCHAR(64) NOT NULL,
            title VARCHAR(255) NOT NULL,
            message TEXT NOT NULL,
            status VARCHAR(32) NOT NULL DEFAULT 'unseen',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability_changes (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            technician_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status VARCHAR(32) NOT NULL,
            source VARCHAR(32) NOT NULL,
            changed_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_users_scheduled_unavailable_date ON users(scheduled_unavailable_date);
        CREATE INDEX IF NOT EXISTS idx_appointments_client_id ON appointments(client_id);
        CREATE INDEX IF NOT EXISTS idx_services_technician_id ON services(technician_id);
        CREATE INDEX IF NOT EXISTS idx_services_status ON services(status);
        CREATE INDEX IF NOT EXISTS idx_availability_changes_technician_id ON availability_changes(technician_id);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
