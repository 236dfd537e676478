use std::fs;
use std::sync::Arc;

use pedicare_application::{
    AuthorizationService, OperationPermissionMap, PatientService, SecurityAdminService,
};
use pedicare_core::AppError;
use pedicare_infrastructure::{
    PostgresAuditRepository, PostgresAuthorizationRepository, PostgresPatientRepository,
    PostgresSecurityAdminRepository, PostgresTenantRepository,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub async fn connect_and_migrate(config: &ApiConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

pub async fn build_session_layer(
    pool: PgPool,
    cookie_secure: bool,
) -> Result<SessionManagerLayer<PostgresStore>, AppError> {
    let session_store = PostgresStore::new(pool)
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;

    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    Ok(SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30))))
}

/// Loads the operation map and validates it against the catalog.
///
/// Startup fails on any key that is malformed or missing from the catalog.
pub fn load_operation_permissions(config: &ApiConfig) -> Result<OperationPermissionMap, AppError> {
    let Some(path) = &config.permission_policy_path else {
        return Ok(OperationPermissionMap::clinic_default());
    };

    let document = fs::read_to_string(path).map_err(|error| {
        AppError::Validation(format!(
            "failed to read PERMISSION_POLICY_PATH '{}': {error}",
            path.display()
        ))
    })?;
    let operation_permissions = OperationPermissionMap::from_policy_json(&document)?;

    info!(
        path = %path.display(),
        permissions = operation_permissions.catalog().len(),
        "loaded access policy"
    );

    Ok(operation_permissions)
}

pub fn build_app_state(
    pool: PgPool,
    config: &ApiConfig,
    operation_permissions: OperationPermissionMap,
) -> AppState {
    let authorization_service = AuthorizationService::new(
        Arc::new(PostgresAuthorizationRepository::new(pool.clone())),
        Arc::new(operation_permissions),
    );
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let tenant_repository = Arc::new(PostgresTenantRepository::new(pool.clone()));

    AppState {
        security_admin_service: SecurityAdminService::new(
            authorization_service.clone(),
            Arc::new(PostgresSecurityAdminRepository::new(pool.clone())),
            audit_repository.clone(),
        ),
        patient_service: PatientService::new(
            authorization_service.clone(),
            Arc::new(PostgresPatientRepository::new(pool.clone())),
            audit_repository,
        ),
        authorization_service,
        subject_directory: tenant_repository.clone(),
        tenant_repository,
        postgres_pool: Some(pool),
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    }
}
