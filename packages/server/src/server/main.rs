// Main entry point for the KBO sync service

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use kbo_sync::{
    kernel::{connect_options, run_scheduled_sweep, start_scheduler, PgOrganizationStore, ServerDeps},
    server::build_app,
    Config,
};
use registry_client::RegistryClient;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kbo_sync=debug,registry_client=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting KBO sync service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let connect = connect_options(
        &config.database_url,
        Duration::from_secs(config.db_statement_timeout_secs),
    )?;
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let registry = RegistryClient::new(
        &config.registry_base_url,
        config.registry_fields.clone(),
        config.registry_timeout_secs,
    )
    .context("Failed to create registry client")?;

    let deps = ServerDeps::new(
        Arc::new(PgOrganizationStore::new(pool, &config.resource_base_uri)),
        Arc::new(registry),
    );

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = start_scheduler(deps.clone(), &config.sync_cron_pattern)
        .await
        .context("Failed to start scheduler")?;

    if config.run_sweep_on_startup {
        let startup_deps = deps.clone();
        tokio::spawn(async move {
            run_scheduled_sweep(&startup_deps).await;
        });
    }

    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
