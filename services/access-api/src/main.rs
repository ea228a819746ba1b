//! Lectern Access API
//!
//! HTTP surface of the access-control core.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/auth/register` - Create a password account and sign in
//! - `POST /api/v1/auth/login` - Sign in
//! - `POST /api/v1/auth/refresh` - Rotate the session (rotation cookie)
//! - `POST /api/v1/auth/logout` - End this session
//! - `POST /api/v1/auth/logout-all` - End every session
//! - `POST /api/v1/auth/password` - Change password (ends every session)
//! - `GET /api/v1/auth/me` - Decoded access token
//! - `GET /api/v1/auth/sessions` - Active sessions
//! - `GET /api/v1/lessons/{lesson_id}/access` - Lesson entitlement
//! - `GET /api/v1/courses/{course_id}/access` - Course entitlement
//! - `POST /api/v1/institutions/claim` - Claim a roster seat
//! - `POST /api/v1/orgs/{org_id}/roster` - Upload roster rows
//! - `PUT|DELETE /api/v1/orgs/{org_id}/courses/{course_id}` - Organization grants
//! - `PUT|DELETE /api/v1/orgs/{org_id}/batches/{batch_id}/courses/{course_id}` - Batch grants
//! - `POST /api/v1/admin/users/{user_id}/subscription` - Activate a paid subscription
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod handlers;
mod routes;
mod state;

use std::net::SocketAddr;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format)?;

    tracing::info!("Starting Lectern Access API");
    tracing::info!(
        http_port = config.http_port,
        reuse_policy = ?config.auth.reuse_policy,
        roster_link_policy = ?config.auth.roster_link_policy,
        "Configuration loaded"
    );

    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    let pool = lectern_db::create_pool(&config.database_url).await?;
    lectern_db::run_migrations(&pool).await?;
    tracing::info!("Database pool created, migrations applied");

    let state = AppState::new(pool, config.clone());
    tokio::spawn(prune_expired_tokens(state.clone()));

    let app = build_router(state, metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("access_api=debug".parse()?);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!(
        "lectern_sessions_issued_total",
        "Credential pairs issued at login, registration and rotation"
    );
    metrics::describe_counter!("lectern_rotations_total", "Successful token rotations");
    metrics::describe_counter!(
        "lectern_token_reuse_detected_total",
        "Revoked rotation tokens presented again"
    );
    metrics::describe_counter!(
        "lectern_enrollments_created_total",
        "Enrollment rows materialized by source"
    );
    metrics::describe_counter!(
        "lectern_fanout_failures_total",
        "Enrollment inserts or fan-out runs that failed"
    );
    metrics::describe_counter!("lectern_claims_total", "Roster claim attempts by outcome");
    metrics::describe_counter!(
        "lectern_access_checks_total",
        "Entitlement decisions by outcome"
    );

    Ok(handle)
}

/// Periodically delete expired rotation tokens. Revoked rows that have not
/// expired are kept.
async fn prune_expired_tokens(state: AppState) {
    let mut interval = tokio::time::interval(state.config.prune_interval);
    loop {
        interval.tick().await;
        if let Err(e) = state.sessions.prune_expired().await {
            tracing::warn!(error = %e, "Rotation token pruning failed");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
