use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// RepoError
///
/// Failure surfaced by the repository layer. A missing record is *not* an error
/// (repository methods return `Ok(None)` for that); this type covers the
/// infrastructure cases where the store itself misbehaved, plus the one
/// constraint the database enforces on our behalf.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The unique index on `email` rejected the write.
    #[error("duplicate email")]
    DuplicateEmail,
    /// The store was unreachable or the query failed.
    #[error("credential store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// AppError
///
/// The application's typed error vocabulary. Every service failure is one of
/// these kinds; the `IntoResponse` impl below is the single place where kinds
/// map to HTTP statuses and `{ "message": ... }` bodies. Infrastructure detail
/// is logged but never serialized into a response.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad or missing input.
    #[error("{0}")]
    Validation(String),

    /// Registration or update would reuse an existing email.
    #[error("Email already exists")]
    DuplicateEmail,

    /// An attempt to claim the privileged "admin" role through the public API.
    #[error("admin already exists")]
    AdminReservation,

    /// Known email, wrong password.
    #[error("Invalid password")]
    BadCredentials,

    /// No session token was presented.
    #[error("Authentication required")]
    Unauthenticated,

    /// Invalid/expired token, or a valid identity lacking the needed rights.
    #[error("{0}")]
    Forbidden(String),

    /// The requested user or crime does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Password hashing or token signing failed.
    #[error("Internal Server Error")]
    Internal,

    /// The credential store failed.
    #[error("Internal Server Error")]
    Infrastructure(#[source] RepoError),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::DuplicateEmail => AppError::DuplicateEmail,
            other => AppError::Infrastructure(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateEmail
            | AppError::AdminReservation
            | AppError::BadCredentials => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal | AppError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Infrastructure(err) = &self {
            tracing::error!(error = %err, "repository failure");
        }
        let status = self.status();
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_expected_statuses() {
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::AdminReservation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::BadCredentials.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("Access denied".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("User not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Infrastructure(RepoError::Store(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn infrastructure_detail_never_reaches_the_body() {
        let err = AppError::Infrastructure(RepoError::Store(sqlx::Error::PoolTimedOut));
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn repo_duplicate_becomes_duplicate_email() {
        let err: AppError = RepoError::DuplicateEmail.into();
        assert!(matches!(err, AppError::DuplicateEmail));
    }
}
