use axum::Json;
use axum::extract::{Extension, Path, State};
use pedicare_core::Subject;

use crate::dto::{AuthorizationDecisionResponse, EffectivePermissionsResponse, MeResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn me_handler(Extension(subject): Extension<Subject>) -> Json<MeResponse> {
    Json(MeResponse::from(subject))
}

pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let permissions = state
        .authorization_service
        .effective_permissions(&subject)
        .await?;

    Ok(Json(EffectivePermissionsResponse::from(permissions)))
}

/// Answers whether the session subject holds one catalog permission.
///
/// Keys outside the catalog are rejected as invalid input rather than
/// reported as denied.
pub async fn authorize_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(permission): Path<String>,
) -> ApiResult<Json<AuthorizationDecisionResponse>> {
    let permission = state
        .authorization_service
        .catalog()
        .resolve(permission.as_str())?;

    let decision = state
        .authorization_service
        .authorize(&subject, &permission)
        .await?;

    Ok(Json(AuthorizationDecisionResponse {
        permission: permission.to_string(),
        decision,
    }))
}
