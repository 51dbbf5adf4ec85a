//! Pure functions for mapping storage errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `AlreadyExists` -> 409 (Conflict)
/// - `ConnectionFailed` -> 503 (Service Unavailable)
/// - `QueryFailed` -> 500 (Internal Server Error)
/// - `Serialization` -> 500 (Internal Server Error)
/// - `InvalidData` -> 400 (Bad Request)
///
/// # Examples
///
/// ```
/// use peeth_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::ConnectionFailed("table unreachable".to_string());
/// assert_eq!(repository_error_to_status_code(&error), 503);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_) => 500,
        RepositoryError::Serialization(_) => 500,
        RepositoryError::InvalidData(_) => 400,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_a_status() {
        let cases = [
            (
                RepositoryError::NotFound {
                    entity_type: "USER",
                    id: "1".to_string(),
                },
                404,
            ),
            (
                RepositoryError::AlreadyExists {
                    entity_type: "USER",
                    id: "1".to_string(),
                },
                409,
            ),
            (RepositoryError::ConnectionFailed("down".to_string()), 503),
            (RepositoryError::QueryFailed("bad".to_string()), 500),
            (RepositoryError::Serialization("bad".to_string()), 500),
            (RepositoryError::InvalidData("bad".to_string()), 400),
        ];

        for (error, status) in cases {
            assert_eq!(repository_error_to_status_code(&error), status, "{error}");
        }
    }
}
