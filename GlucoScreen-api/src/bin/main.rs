use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use gluco_screen_api::api::routes::{AdminBootstrap, AppState};
use gluco_screen_api::create_app;
use gluco_screen_domain::auth::firebase::FirebaseAuthGateway;
use gluco_screen_domain::auth::local::LocalAuthGateway;
use gluco_screen_domain::auth::token_blacklist::start_cleanup_task;
use gluco_screen_domain::auth::AuthGateway;
use gluco_screen_domain::classifier::{ForestClassifier, RiskClassifier};
use gluco_screen_domain::config::{AppConfig, AuthProvider};
use gluco_screen_domain::database;

/// Entry point of the GlucoScreen API server
///
/// Loads `.env`, installs tracing, loads the classifier (exiting if the
/// artifact is unusable), opens the database, wires the services and serves
/// until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stdout),
        )
        .with(env_filter)
        .init();

    info!("Starting GlucoScreen API server");

    let config = AppConfig::from_env().context("invalid configuration")?;

    if std::env::var("JWT_SECRET").is_err() {
        bail!("JWT_SECRET must be set");
    }

    // The classifier is required; serving without it is not an option
    let classifier: Arc<dyn RiskClassifier> = match ForestClassifier::load(&config.model_path) {
        Ok(model) => {
            let info = model.model_info();
            info!("Loaded model {} v{} ({} trees)", info.name, info.version, info.tree_count);
            Arc::new(model)
        }
        Err(e) => {
            error!("Model unavailable at {}: {}", config.model_path.display(), e);
            std::process::exit(1);
        }
    };

    let data_dir = PathBuf::from(&config.data_dir);
    if !data_dir.exists() {
        info!("Creating data directory: {}", data_dir.display());
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("cannot create data directory {}", data_dir.display()))?;
    }
    if std::env::var("DB_SQLITE_PATH").is_err() {
        let db_path = data_dir.join("gluco_screen.db");
        std::env::set_var("DB_SQLITE_PATH", &db_path);
        info!("Set DB_SQLITE_PATH to {}", db_path.display());
    }

    let pool = match database::initialize_database_pool().and_then(|_| database::get_db_pool()) {
        Ok(pool) => {
            info!("Database ready: {}", database::describe_pool(&pool));
            Some(pool)
        }
        Err(e) => {
            // Results are then kept in memory for the lifetime of the process
            error!("Failed to initialize database pool: {}", e);
            None
        }
    };

    let gateway: Arc<dyn AuthGateway> = match (config.auth_provider, config.firebase.clone()) {
        (AuthProvider::Firebase, Some(settings)) => {
            info!("Using Firebase identity provider");
            Arc::new(FirebaseAuthGateway::new(settings))
        }
        (AuthProvider::Firebase, None) => bail!("AUTH_PROVIDER=firebase requires FIREBASE_API_KEY"),
        (AuthProvider::Local, _) => {
            if config.is_production() {
                warn!("Local identity provider in production: accounts are lost on restart");
            }
            Arc::new(LocalAuthGateway::new())
        }
    };

    let admin_account = match (config.admin_email.clone(), config.admin_password.clone()) {
        (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
        (Some(_), None) | (None, Some(_)) => {
            warn!("ADMIN_EMAIL and ADMIN_PASSWORD must both be set, skipping admin bootstrap");
            None
        }
        (None, None) => None,
    };

    let state = AppState::assemble(classifier, gateway, pool, admin_account)
        .await
        .context("cannot assemble services")?;

    start_cleanup_task();

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down server...");
}
