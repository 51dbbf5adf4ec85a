//! Service-level errors shared by every entity module.

use thiserror::Error;

use crate::storage::{repository_error_to_status_code, RepositoryError};
use crate::validation::ValidationError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    /// A uniqueness pre-check found an existing record.
    #[error("{field} '{value}' is already in use")]
    Duplicate { field: &'static str, value: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl ServiceError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Maps a [`ServiceError`] to an HTTP status code.
///
/// Duplicates are a client mistake and map to 400, not 409; storage errors
/// keep the storage mapping.
pub fn service_error_to_status_code(error: &ServiceError) -> u16 {
    match error {
        ServiceError::NotFound { .. } => 404,
        ServiceError::Duplicate { .. } => 400,
        ServiceError::Validation(_) => 400,
        ServiceError::BadRequest(_) => 400,
        ServiceError::Storage(e) => repository_error_to_status_code(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_bad_request() {
        let error = ServiceError::Duplicate {
            field: "slug",
            value: "home".to_string(),
        };
        assert_eq!(error.to_string(), "slug 'home' is already in use");
        assert_eq!(service_error_to_status_code(&error), 400);
    }

    #[test]
    fn test_storage_errors_keep_their_status() {
        let error: ServiceError = RepositoryError::ConnectionFailed("down".to_string()).into();
        assert_eq!(service_error_to_status_code(&error), 503);
    }

    #[test]
    fn test_not_found_helper() {
        let error = ServiceError::not_found("CmsPage", "abc");
        assert_eq!(error.to_string(), "CmsPage not found: abc");
        assert_eq!(service_error_to_status_code(&error), 404);
    }
}
