use pedicare_core::AppError;

const UNIQUE_VIOLATION: &str = "23505";

/// Maps a sqlx failure to the application error taxonomy.
///
/// Connectivity failures become `Unavailable` so callers never mistake an
/// unreachable store for an empty one.
pub(crate) fn map_sqlx_error(context: &str, error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            AppError::Unavailable(format!("failed to {context}: {error}"))
        }
        sqlx::Error::Database(database_error)
            if database_error.code().as_deref() == Some(UNIQUE_VIOLATION) =>
        {
            AppError::Conflict(format!("failed to {context}: duplicate entry"))
        }
        _ => AppError::Internal(format!("failed to {context}: {error}")),
    }
}
