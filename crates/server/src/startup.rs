use std::net::SocketAddr;

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Apply pending migrations; an already-applied schema is not an error.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), StartupError> {
    if let Err(e) = migration::Migrator::up(db, None).await {
        let msg = e.to_string();
        if msg.contains("duplicate key value violates unique constraint") {
            warn!(error = %msg, "migrations already applied, continue");
        } else {
            return Err(StartupError::Migration(msg));
        }
    }
    Ok(())
}

/// Create the configured admin account once.
async fn bootstrap_admin(state: &ServerState, cfg: &AppConfig) -> Result<(), StartupError> {
    let (Some(email), Some(password)) = (&cfg.auth.bootstrap_admin_email, &cfg.auth.bootstrap_admin_password) else {
        return Ok(());
    };
    match state.auth.bootstrap_admin(email, password).await {
        Ok(Some(user)) => info!(user_id = %user.id, email = %user.email, "bootstrap_admin_created"),
        Ok(None) => {}
        Err(e) => return Err(StartupError::InvalidConfig(format!("bootstrap admin: {e}"))),
    }
    Ok(())
}

/// Router over a live database using the given configuration.
pub fn app(db: DatabaseConnection, cfg: &AppConfig) -> Router {
    routes::build_router(ServerState::new(db, cfg), build_cors())
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    migrate(&db).await?;

    let state = ServerState::new(db, &cfg);
    bootstrap_admin(&state, &cfg).await?;
    let app = routes::build_router(state, build_cors());

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, draining connections");
}
