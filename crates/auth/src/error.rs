use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use peeth_core::storage::RepositoryError;
use peeth_core::{service_error_to_status_code, ServiceError};
use thiserror::Error;

/// Auth errors for the peeth_auth crate.
///
/// Wraps the core `AuthError` and adds the failures of the I/O around it.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login flow and token errors from the core auth module.
    #[error(transparent)]
    Core(#[from] peeth_core::auth::AuthError),

    /// User lookups, email validation and challenge storage.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Signing a token failed.
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        AuthError::Service(ServiceError::Storage(err))
    }
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        use peeth_core::auth::AuthError as CoreError;

        match self {
            AuthError::Core(core_err) => match core_err {
                CoreError::MissingToken
                | CoreError::InvalidToken(_)
                | CoreError::TokenExpired
                | CoreError::InvalidCode
                | CoreError::TooManyAttempts => StatusCode::UNAUTHORIZED,
                CoreError::Forbidden { .. } => StatusCode::FORBIDDEN,
                CoreError::CooldownActive { .. } => StatusCode::TOO_MANY_REQUESTS,
                CoreError::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AuthError::Service(service_err) => StatusCode::from_u16(
                service_error_to_status_code(service_err),
            )
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AuthError::Signing(_) | AuthError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Auth error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peeth_core::auth::AuthError as CoreError;
    use peeth_core::users::Role;

    #[test]
    fn login_failures_are_unauthorized() {
        for err in [
            CoreError::MissingToken,
            CoreError::InvalidToken("bad".to_string()),
            CoreError::TokenExpired,
            CoreError::InvalidCode,
            CoreError::TooManyAttempts,
        ] {
            assert_eq!(AuthError::from(err).status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn guard_and_cooldown_statuses() {
        let forbidden = AuthError::from(CoreError::Forbidden {
            required: Role::Admin,
        });
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(forbidden.to_string(), "requires the admin role");

        let cooldown = AuthError::from(CoreError::CooldownActive {
            retry_after_secs: 30,
        });
        assert_eq!(cooldown.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn service_errors_keep_their_mapping() {
        let invalid_email: AuthError = ServiceError::BadRequest("nope".to_string()).into();
        assert_eq!(invalid_email.status_code(), StatusCode::BAD_REQUEST);

        let down: AuthError = RepositoryError::ConnectionFailed("down".to_string()).into();
        assert_eq!(down.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
