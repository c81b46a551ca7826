//! # RepairDesk API
//!
//! The API crate provides the web server for the RepairDesk repair shop
//! service. It exposes booking and triage, the technician work order
//! lifecycle, availability controls, user removal and a live change-event
//! stream.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Extract and check the request, then call a service
//! - **Services**: Orchestrate store reads, lifecycle rules, broadcasts and jobs
//! - **Middleware**: Caller identification and error mapping
//! - **Config**: Handle environment and application configuration
//!
//! Persistence goes through the [`EntityStore`] trait so the same router runs
//! on PostgreSQL in production and on an in-memory store in tests.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Caller identification and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;
/// Lifecycle and availability orchestration
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, http::HeaderValue};
use eyre::Result;
use repairdesk_core::{
    clock::{Clock, SystemClock},
    events::Broadcaster,
    store::EntityStore,
};
use repairdesk_worker::{
    BroadcastHub, JobRunner, LeaseTable, StoreJobHandler, Sweeper, WorkerConfig,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use services::{AvailabilityManager, LifecycleService};

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    pub store: Arc<dyn EntityStore>,
    pub clock: Arc<dyn Clock>,
    /// Source of the `/api/events` stream
    pub hub: Arc<BroadcastHub>,
    pub jobs: JobRunner,
    pub lifecycle: LifecycleService,
    pub availability: AvailabilityManager,
    pub sweeper: Arc<Sweeper>,
    pub store_timeout: Duration,
    /// Cancelled on shutdown; ends open event streams and the sweep loop
    pub shutdown: CancellationToken,
}

impl ApiState {
    pub fn new(
        store: Arc<dyn EntityStore>,
        clock: Arc<dyn Clock>,
        worker: &WorkerConfig,
        store_timeout: Duration,
    ) -> Self {
        let hub = Arc::new(BroadcastHub::new(worker.broadcast_capacity));
        Self::assemble(store, clock, worker, store_timeout, hub.clone(), hub)
    }

    /// Like [`ApiState::new`] but publishes through `broadcaster` instead of
    /// the hub that feeds the event stream.
    pub fn with_broadcaster(
        store: Arc<dyn EntityStore>,
        clock: Arc<dyn Clock>,
        worker: &WorkerConfig,
        store_timeout: Duration,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        let hub = Arc::new(BroadcastHub::new(worker.broadcast_capacity));
        Self::assemble(store, clock, worker, store_timeout, hub, broadcaster)
    }

    fn assemble(
        store: Arc<dyn EntityStore>,
        clock: Arc<dyn Clock>,
        worker: &WorkerConfig,
        store_timeout: Duration,
        hub: Arc<BroadcastHub>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        let leases = Arc::new(LeaseTable::new(clock.clone(), worker.job_lock_ttl()));
        let handler = Arc::new(StoreJobHandler::new(store.clone(), broadcaster.clone()));
        let jobs = JobRunner::new(handler, leases);

        let lifecycle = LifecycleService::new(
            store.clone(),
            broadcaster,
            jobs.clone(),
            clock.clone(),
            store_timeout,
        );
        let availability = AvailabilityManager::new(store.clone(), clock.clone(), store_timeout);
        let sweeper = Arc::new(Sweeper::new(store.clone(), clock.clone()));

        Self {
            store,
            clock,
            hub,
            jobs,
            lifecycle,
            availability,
            sweeper,
            store_timeout,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Builds the application router with every route attached to `state`.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Booking and triage endpoints
        .merge(routes::appointments::routes())
        // Work order lifecycle endpoints
        .merge(routes::services::routes())
        // Technician availability endpoints
        .merge(routes::availability::routes())
        // User removal and on-demand sweep
        .merge(routes::admin::routes())
        // Change-event stream
        .merge(routes::events::routes())
        .with_state(state)
}

/// Starts the API server and the periodic sweep loop.
///
/// Runs until ctrl-c, then stops the sweep loop and drains open requests.
pub async fn start_server(config: config::ApiConfig, store: Arc<dyn EntityStore>) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.worker.timezone));
    let state = Arc::new(ApiState::new(
        store,
        clock,
        &config.worker,
        config.store_timeout,
    ));

    let cancel = state.shutdown.clone();
    let sweep_loop = {
        let sweeper = state.sweeper.clone();
        let cancel = cancel.clone();
        let interval = config.worker.sweep_interval;
        tokio::spawn(async move { sweeper.run_periodic(interval, cancel).await })
    };

    let app = build_router(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
                axum::http::HeaderName::from_static(middleware::actor::ACTOR_ID_HEADER),
                axum::http::HeaderName::from_static(middleware::actor::ACTOR_ROLE_HEADER),
            ])
            .allow_origin(origins)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout))),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    sweep_loop.await?;
    Ok(())
}
