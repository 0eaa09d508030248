//! HTTP server initialization and runtime setup.
//!
//! Handles the database pool, migrations, GeoIP provider selection, service
//! wiring and the Axum server lifecycle.

use crate::application::services::{AuthService, CampaignService, ClickResolver, LinkService};
use crate::config::Config;
use crate::domain::classifier::ClientClassifier;
use crate::domain::repositories::{
    CampaignRepository, EventRepository, LinkRepository, SessionRepository,
};
use crate::infrastructure::geoip;
use crate::infrastructure::persistence::{
    PgCampaignRepository, PgEventRepository, PgLinkRepository, PgSessionRepository,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - GeoIP provider (MaxMind or the null provider)
/// - Axum HTTP server with graceful shutdown on Ctrl+C / SIGTERM
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let state = build_state(&config, Arc::new(pool));

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Opens the connection pool with the configured limits.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Wires repositories and services into the shared state.
pub fn build_state(config: &Config, pool: Arc<PgPool>) -> AppState {
    let links: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
    let events: Arc<dyn EventRepository> = Arc::new(PgEventRepository::new(pool.clone()));
    let campaigns: Arc<dyn CampaignRepository> =
        Arc::new(PgCampaignRepository::new(pool.clone()));
    let sessions: Arc<dyn SessionRepository> = Arc::new(PgSessionRepository::new(pool));

    let geo = geoip::from_config(config.geoip_db_path.as_deref());
    let geo_provider = geo.name();

    let click_resolver = Arc::new(ClickResolver::new(
        links.clone(),
        events.clone(),
        geo,
        ClientClassifier::default(),
    ));
    let link_service = Arc::new(LinkService::new(
        links.clone(),
        events,
        campaigns.clone(),
        config.max_redirect_delay,
    ));
    let campaign_service = Arc::new(CampaignService::new(campaigns));
    let auth_service = Arc::new(AuthService::new(
        sessions,
        config.session_signing_secret.clone(),
    ));

    AppState {
        click_resolver,
        link_service,
        campaign_service,
        auth_service,
        links,
        geo_provider,
        public_base_url: config.public_base_url.clone(),
        behind_proxy: config.behind_proxy,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
