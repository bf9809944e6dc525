//! # ProjectDesk API Server
//!
//! Serves the client, project and task endpoints over HTTP.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (and `.env`)
//! 2. Create the database if needed, connect and run migrations
//! 3. Optionally seed the demo users and clients
//! 4. Load the role to permission map
//! 5. Serve until Ctrl-C, then close the pool
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/projectdesk cargo run -p projectdesk-api
//! ```

use anyhow::Context;
use projectdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use projectdesk_shared::{
    auth::authorization::PermissionCache,
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::connect,
        seed::seed_demo_data,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "projectdesk_api=debug,projectdesk_shared=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "ProjectDesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    ensure_database_exists(&config.database.url)
        .await
        .context("failed to create database")?;

    let pool = connect(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to database")?;

    run_migrations(&pool).await.context("failed to run migrations")?;

    if config.seed_demo_data {
        let report = seed_demo_data(&pool).await.context("failed to seed demo data")?;
        tracing::info!(
            users_created = report.users_created,
            clients_created = report.clients_created,
            "Demo data ready"
        );
    }

    let permissions = PermissionCache::load(&pool)
        .await
        .context("failed to load permissions")?;
    tracing::info!(roles = permissions.role_count().await, "Permissions loaded");

    let address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, permissions));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    tracing::info!("Database pool closed, shutdown complete");

    Ok(())
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
