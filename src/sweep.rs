//! One-shot scheduled-unavailability sweep, for running from cron.
//!
//! Sweeps the shop's current day, or the date given as the first argument
//! (`YYYY-MM-DD`).

use std::sync::Arc;

use chrono::NaiveDate;
use color_eyre::eyre::{Result, WrapErr};
use dotenv::dotenv;
use repairdesk_core::clock::{Clock, SystemClock};
use repairdesk_db::{PgStore, create_pool};
use repairdesk_worker::{Sweeper, WorkerConfig};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load environment variables
    dotenv().ok();

    let config = WorkerConfig::from_env()?;
    let database_url = std::env::var("DATABASE_URL")
        .wrap_err("DATABASE_URL environment variable must be set")?;

    let clock = Arc::new(SystemClock::new(config.timezone));
    let today = match std::env::args().nth(1) {
        Some(arg) => NaiveDate::parse_from_str(&arg, "%Y-%m-%d")
            .wrap_err_with(|| format!("Invalid date argument '{arg}', expected YYYY-MM-DD"))?,
        None => clock.today(),
    };

    let db_pool = create_pool(&database_url, std::time::Duration::from_secs(30)).await?;
    let sweeper = Sweeper::new(Arc::new(PgStore::new(db_pool)), clock);

    info!(%today, "Running sweep");
    let report = sweeper.run(today).await?;
    info!(
        updated = report.updated_count,
        skipped = report.skipped_count,
        failed = report.failed_count,
        "Sweep complete"
    );

    Ok(())
}
