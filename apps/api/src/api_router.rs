use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use pedicare_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/api/me", get(handlers::me::me_handler))
        .route(
            "/api/me/permissions",
            get(handlers::me::my_permissions_handler),
        )
        .route(
            "/api/me/authorize/{permission}",
            get(handlers::me::authorize_handler),
        )
        .route(
            "/api/security/catalog",
            get(handlers::security::catalog_handler),
        )
        .route(
            "/api/security/roles",
            get(handlers::security::list_roles_handler).post(handlers::security::create_role_handler),
        )
        .route(
            "/api/security/roles/{role_name}/permissions",
            put(handlers::security::update_role_permissions_handler),
        )
        .route(
            "/api/security/role-assignments",
            get(handlers::security::list_role_assignments_handler)
                .post(handlers::security::assign_role_handler)
                .delete(handlers::security::unassign_role_handler),
        )
        .route(
            "/api/security/subjects",
            get(handlers::security::list_subjects_handler),
        )
        .route(
            "/api/security/subjects/{subject_id}/status",
            put(handlers::security::update_subject_status_handler),
        )
        .route(
            "/api/patients",
            get(handlers::patients::list_patients_handler)
                .post(handlers::patients::create_patient_handler),
        )
        .route(
            "/api/patients/{patient_id}",
            get(handlers::patients::get_patient_handler)
                .put(handlers::patients::update_patient_handler)
                .delete(handlers::patients::delete_patient_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}

fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    Ok(CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]))
}
