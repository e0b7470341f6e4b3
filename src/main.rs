//! Keymint Server — license issuance, binding, validation, and revocation.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use keymint_api::AppState;
use keymint_auth::AdminAuthenticator;
use keymint_core::config::AppConfig;
use keymint_core::config::store::BackendKind;
use keymint_core::error::AppError;
use keymint_engine::{AuditLogger, LicenseService, ValidationEngine};

#[tokio::main]
async fn main() {
    let env = std::env::var("KEYMINT_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
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
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Keymint v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Data directory for the embedded engine ───────────
    if config.store.backend == BackendKind::Sqlite {
        create_sqlite_data_dir(&config.store.url).await?;
    }

    // ── Step 2: Connect the configured store ─────────────────────
    let store = keymint_store::connect(&config.store).await?;

    // ── Step 3: Auth system + bootstrap admin ────────────────────
    tracing::info!("Initializing authentication...");
    let authenticator = Arc::new(AdminAuthenticator::new(&config.auth, Arc::clone(&store))?);
    authenticator
        .ensure_bootstrap_admin(
            &config.auth.bootstrap_admin_username,
            &config.auth.bootstrap_admin_password,
        )
        .await?;

    // ── Step 4: Lifecycle engine ─────────────────────────────────
    let audit = AuditLogger::new(Arc::clone(&store));
    let engine = Arc::new(ValidationEngine::new(Arc::clone(&store), audit.clone()));
    let licenses = Arc::new(LicenseService::new(
        Arc::clone(&store),
        audit.clone(),
        config.license.clone(),
    ));

    // ── Step 5: Build and start the HTTP server ──────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app_state = AppState {
        config: Arc::new(config),
        store,
        authenticator,
        engine,
        licenses,
        audit: Arc::new(audit),
    };
    let app = keymint_api::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Keymint server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Keymint server shut down gracefully");
    Ok(())
}

/// Create the parent directory of the SQLite database file.
async fn create_sqlite_data_dir(url: &str) -> Result<(), AppError> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    if path.is_empty() || path.starts_with(':') {
        // In-memory databases need no directory.
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::internal(format!("Failed to create dir '{}': {e}", parent.display()))
            })?;
        }
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
