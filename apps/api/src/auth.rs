use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use pedicare_core::{AppError, AppResult, Subject, TenantId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;

use crate::dto::BootstrapRequest;
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_IDENTITY_KEY: &str = "session_identity";


/// Identity stored in the session after sign-in.
///
/// Only the identifiers are kept. Status is re-read on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub subject_id: String,
    pub tenant_id: TenantId,
}

pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let subject_id = payload.subject.trim();
    if subject_id.is_empty() {
        return Err(AppError::Validation("subject must not be empty".to_owned()).into());
    }

    state
        .tenant_repository
        .ensure_membership(
            payload.tenant_id,
            subject_id,
            subject_id,
            state.authorization_service.catalog(),
        )
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(
            SESSION_IDENTITY_KEY,
            &SessionIdentity {
                subject_id: subject_id.to_owned(),
                tenant_id: payload.tenant_id,
            },
        )
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    info!(subject = %subject_id, tenant_id = %payload.tenant_id, "session started");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .flush()
        .await
        .map_err(|error| AppError::Internal(format!("failed to end session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Loads the session identity and its current subject state.
pub async fn current_subject(state: &AppState, session: &Session) -> AppResult<Subject> {
    let identity = session
        .get::<SessionIdentity>(SESSION_IDENTITY_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    state
        .subject_directory
        .find_subject(identity.tenant_id, identity.subject_id.as_str())
        .await?
        .ok_or_else(|| AppError::Unauthorized("session subject no longer exists".to_owned()))
}
