//! SPX Snapshot Backend Server
//!
//! Captures SPX option chains on a schedule and serves them over REST.

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use spx_snapshot_backend::api::create_router;
use spx_snapshot_backend::config::Config;
use spx_snapshot_backend::db::{DatabasePool, PgSnapshotStore};
use spx_snapshot_backend::error::ErrorResponse;
use spx_snapshot_backend::models::{
    HealthResponse, QuotesResponse, SnapshotDetailResponse, SnapshotListResponse,
    SnapshotSummary,
};
use spx_snapshot_backend::scheduler::{SnapshotRunner, spawn_scheduler};
use spx_snapshot_backend::snapshot::{
    InsertedSnapshot, MarketDataSource, RunResult, SkipReason, SnapshotJob, SystemClock,
};
use spx_snapshot_backend::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tradier_client::{ClientConfig, TradierClient};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        spx_snapshot_backend::api::handlers::health_check,
        spx_snapshot_backend::api::handlers::home,
        spx_snapshot_backend::api::handlers::list_chain_snapshots,
        spx_snapshot_backend::api::handlers::get_chain_snapshot,
        spx_snapshot_backend::api::handlers::get_quotes,
        spx_snapshot_backend::api::handlers::run_snapshot,
    ),
    components(
        schemas(
            HealthResponse,
            SnapshotSummary,
            SnapshotListResponse,
            SnapshotDetailResponse,
            QuotesResponse,
            RunResult,
            InsertedSnapshot,
            SkipReason,
            ErrorResponse,
        )
    ),
    modifiers(&AdminKeyScheme),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Snapshots", description = "Stored option-chain snapshots"),
        (name = "Market Data", description = "Live market data proxy"),
        (name = "Admin", description = "Administrative operations"),
    ),
    info(
        title = "SPX Snapshot API",
        version = "0.1.0",
        description = "REST API for scheduled SPX option-chain snapshots",
        license(name = "MIT")
    )
)]
struct ApiDoc;

struct AdminKeyScheme;

impl Modify for AdminKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;

    // Database
    let db = DatabasePool::new(&config.database.url, config.database.max_connections)
        .await
        .context("connecting to database")?;
    db.run_migrations().await.context("running migrations")?;
    info!("Database ready");

    // Market data client
    let tradier = Arc::new(
        TradierClient::new(ClientConfig {
            base_url: config.tradier.base_url.clone(),
            access_token: config.tradier.access_token.clone(),
            ..Default::default()
        })
        .context("building Tradier client")?,
    );
    info!("Using Tradier API at {}", tradier.base_url());

    // Snapshot job and scheduler
    let settings = config.snapshot.job_settings()?;
    info!(
        "Snapshot job: underlying={} targets={:?} tolerance={}d tz={}",
        settings.underlying, settings.dte_targets, settings.tolerance_days, settings.timezone
    );
    let source: Arc<dyn MarketDataSource> = tradier.clone();
    let job = SnapshotJob::new(
        settings,
        source,
        Arc::new(PgSnapshotStore::new(&db)),
        Arc::new(SystemClock),
    );
    let runner = Arc::new(SnapshotRunner::new(job));
    let scheduler = spawn_scheduler(
        runner.clone(),
        config.snapshot.interval(),
        config.snapshot.run_on_startup,
    );

    if config.admin.api_key.is_none() {
        warn!("ADMIN_API_KEY not set; admin endpoints are disabled");
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    let cors = cors_layer(&config.server.cors_origins)?;

    // Create application state
    let state = Arc::new(AppState::new(&config.admin, &db, runner, tradier));

    info!("Starting SPX Snapshot Backend on {}:{}", host, port);
    info!("Swagger UI available at http://{}:{}/swagger-ui/", host, port);

    // Build the router
    let app = create_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start the server
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.abort();
    info!("Server stopped");

    Ok(())
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin: {o}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
