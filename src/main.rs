//! MAFS Server: Mars Abnormal Finding System
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use mafs_api::{AppState, build_app};
use mafs_core::config::AppConfig;
use mafs_core::error::AppError;
use mafs_database::Stores;
use mafs_messaging::{LineClient, ProfileResolver, StaticProfiles, pusher_from_config};
use mafs_service::notification::build_tasks;
use mafs_worker::NotificationScheduler;

#[tokio::main]
async fn main() {
    let env = std::env::var("MAFS_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting MAFS v{}", env!("CARGO_PKG_VERSION"));

    if config.auth.jwt_secret == "CHANGE_ME_IN_PRODUCTION" {
        tracing::warn!("JWT secret is the built-in default; set MAFS__AUTH__JWT_SECRET");
    }

    // ── Step 1: Upload directory ─────────────────────────────────
    tokio::fs::create_dir_all(&config.uploads.root)
        .await
        .map_err(|e| AppError::storage(format!("Cannot create upload root: {e}")))?;

    // ── Step 2: Stores (connects and migrates for PostgreSQL) ────
    let stores = Stores::open(&config.database).await?;
    tracing::info!(backend = stores.backend(), "Stores ready");

    // ── Step 3: Messaging ────────────────────────────────────────
    let pusher = pusher_from_config(&config.line);
    let profiles: Arc<dyn ProfileResolver> = match LineClient::new(&config.line) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!(error = %e, "LINE profile client unavailable, LINE login disabled");
            Arc::new(StaticProfiles::new())
        }
    };

    // ── Step 4: Notification scheduler ───────────────────────────
    let tasks = build_tasks(&stores, pusher, &config.notifications);
    let scheduler = Arc::new(NotificationScheduler::new(Arc::clone(&stores.schedules), tasks).await?);
    if config.notifications.enabled {
        scheduler.start().await?;
    } else {
        tracing::info!("Scheduled notifications disabled by configuration");
    }

    // ── Step 5: Services and bootstrap admin ─────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let bootstrap_password = config.auth.bootstrap_admin_password.clone();
    let state = AppState::new(config, stores.clone(), profiles, Arc::clone(&scheduler));
    if state
        .auth_service
        .ensure_bootstrap_admin(bootstrap_password.as_deref())
        .await?
    {
        tracing::info!("Created bootstrap admin account 'admin'");
    }

    // ── Step 6: HTTP server ──────────────────────────────────────
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("MAFS listening on http://{addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")));

    // ── Shutdown ─────────────────────────────────────────────────
    tracing::info!("Shutting down");
    scheduler.shutdown().await;
    stores.close().await;
    tracing::info!("MAFS stopped");

    served
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
