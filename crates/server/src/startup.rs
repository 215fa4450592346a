use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::catalog::repo::SeaOrmCatalogRepository;
use service::catalog::CatalogRepository;

use crate::errors::StartupError;
use crate::routes;
use crate::state::{dev_auth, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the configured store and assemble handler state.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    if cfg.database.is_memory() {
        warn!(service = "server", event = "memory_store", "using in-memory catalog store; data is lost on exit");
        return ServerState::in_memory(&cfg.auth).map_err(|e| StartupError::InvalidConfig(e.to_string()));
    }

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    if cfg.database.run_migrations {
        migration::Migrator::up(&db, None)
            .await
            .map_err(|e| StartupError::Database(e.to_string()))?;
        info!(service = "server", event = "migrations_applied", "database schema up to date");
    }

    let repo: Arc<dyn CatalogRepository> = Arc::new(SeaOrmCatalogRepository::new(db));
    let auth = dev_auth(&cfg.auth).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(ServerState::new(repo, auth, cfg.auth.expose_dev_credentials))
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(service = "server", event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Public entry: build the app and run the HTTP server until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(service = "server", event = "listening", %addr, memory = cfg.database.is_memory(), "catalog api listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
