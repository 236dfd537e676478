use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use pedicare_core::AppError;
use tower_sessions::Session;

use crate::auth::current_subject;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the session subject and exposes it to protected handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let subject = current_subject(&state, &session).await?;

    request.extensions_mut().insert(subject);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method())
        && !request_origin_is_allowed(request.headers(), state.frontend_url.as_str())
    {
        return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
    }

    Ok(next.run(request).await)
}

fn request_origin_is_allowed(headers: &HeaderMap, allowed_origin: &str) -> bool {
    if headers.get("sec-fetch-site") == Some(&HeaderValue::from_static("cross-site")) {
        return false;
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    origin == allowed_origin || referer.starts_with(allowed_origin)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
