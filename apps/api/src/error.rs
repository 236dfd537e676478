use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pedicare_core::AppError;
use serde::Serialize;
use tracing::{error, warn};

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(message) => {
                warn!(%message, "request denied");
                StatusCode::FORBIDDEN
            }
            AppError::Unavailable(message) => {
                error!(%message, "dependency unavailable");
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Internal(message) => {
                error!(%message, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = Json(ErrorResponse {
            message: self.0.to_string(),
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use pedicare_core::AppError;

    use super::ApiError;

    #[test]
    fn errors_map_to_http_statuses() {
        let cases = [
            (AppError::Validation("bad".to_owned()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("gone".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Conflict("dup".to_owned()), StatusCode::CONFLICT),
            (AppError::Unauthorized("who".to_owned()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("no".to_owned()), StatusCode::FORBIDDEN),
            (
                AppError::Unavailable("db down".to_owned()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal("boom".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError(error).into_response().status(), expected);
        }
    }
}
