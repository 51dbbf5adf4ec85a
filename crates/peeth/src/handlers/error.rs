use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use peeth_auth::AuthError;
use peeth_core::storage::{repository_error_to_status_code, RepositoryError};
use peeth_core::validation::ValidationError;
use peeth_core::{service_error_to_status_code, ServiceError};

/// Handler error: any error, answered with the status of the typed error
/// inside it.
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn status_code(&self) -> StatusCode {
        let code = if let Some(err) = self.0.downcast_ref::<ServiceError>() {
            service_error_to_status_code(err)
        } else if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            repository_error_to_status_code(err)
        } else if let Some(err) = self.0.downcast_ref::<AuthError>() {
            err.status_code().as_u16()
        } else if self.0.downcast_ref::<ValidationError>().is_some() {
            400
        } else {
            500
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Application error");
        }

        (status, self.0.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_the_wrapped_error() {
        let not_found = AppError::from(ServiceError::not_found("CONTENT", "x"));
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let duplicate = AppError::from(ServiceError::Duplicate {
            field: "slug",
            value: "home".to_string(),
        });
        assert_eq!(duplicate.status_code(), StatusCode::BAD_REQUEST);

        let exists = AppError::from(RepositoryError::AlreadyExists {
            entity_type: "USER",
            id: "x".to_string(),
        });
        assert_eq!(exists.status_code(), StatusCode::CONFLICT);

        let forbidden = AppError::from(AuthError::from(peeth_core::auth::AuthError::Forbidden {
            required: peeth_core::users::Role::Admin,
        }));
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let other = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(other.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
