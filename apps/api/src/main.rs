//! PediCare API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

#[cfg(test)]
mod test_support;

use pedicare_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let operation_permissions = api_services::load_operation_permissions(&config)?;
    let pool = api_services::connect_and_migrate(&config).await?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_layer = api_services::build_session_layer(pool.clone(), config.cookie_secure).await?;
    let app_state = api_services::build_app_state(pool, &config, operation_permissions);
    let app = api_router::build_router(app_state, config.frontend_url.as_str(), session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "pedicare-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
