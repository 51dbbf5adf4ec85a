use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{RepositoryError, Result};

/// Opaque marker used to resume a paged query.
///
/// Encodes the backend's last evaluated key as URL-safe base64 JSON, so it
/// can travel in a query string unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn from_key(key: &Map<String, Value>) -> Result<Self> {
        let json = serde_json::to_vec(key)?;
        Ok(Self(URL_SAFE_NO_PAD.encode(json)))
    }

    /// Decodes the key. Tokens come from clients, so any decoding failure
    /// is `InvalidData`.
    pub fn to_key(&self) -> Result<Map<String, Value>> {
        let bytes = URL_SAFE_NO_PAD.decode(&self.0).map_err(malformed)?;
        serde_json::from_slice(&bytes).map_err(malformed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn malformed(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::InvalidData(format!("Malformed continuation token: {error}"))
}

impl From<String> for ContinuationToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_decodes_to_original_key() {
        let key = json!({"PK": "CONTENT#1", "SK": "CONTENT#1", "GSI1PK": "CONTENT"});
        let key = key.as_object().unwrap().clone();

        let token = ContinuationToken::from_key(&key).unwrap();

        assert!(!token.as_str().contains('='));
        assert_eq!(token.to_key().unwrap(), key);
    }

    #[test]
    fn test_garbage_token_is_invalid_data() {
        let token = ContinuationToken::from("not base64 ***".to_string());
        assert!(matches!(
            token.to_key(),
            Err(RepositoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_base64_that_is_not_a_json_object_is_invalid_data() {
        let array = URL_SAFE_NO_PAD.encode("[1,2]");
        for raw in ["abcd".to_string(), array] {
            let result = ContinuationToken::from(raw).to_key();
            let error = result.unwrap_err();
            assert!(matches!(error, RepositoryError::InvalidData(_)), "{error}");
            assert_eq!(crate::storage::repository_error_to_status_code(&error), 400);
        }
    }
}
