//! Storage backend implementations.
//!
//! Concrete implementations of `peeth_core::storage::Storage`. Each backend
//! sits behind a feature flag; both are compiled by default and
//! [`connect`] picks one at startup from [`Config::storage_backend`].
//!
//! # Feature Flags
//!
//! - `document`: document collections in SQLite (`rusqlite` + `tokio-rusqlite`)
//! - `dynamodb`: AWS DynamoDB single table (`aws-sdk-dynamodb`)

#[cfg(not(any(feature = "document", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable the 'document' or 'dynamodb' feature. \
    Example: cargo build -p peeth --no-default-features --features document"
);

#[cfg(feature = "document")]
pub mod document;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

use std::sync::Arc;

use peeth_core::storage::{RepositoryError, Storage};

use crate::config::{Config, StorageBackend};

/// Opens the configured backend. Called once; the returned handle is shared
/// by every service.
pub async fn connect(config: &Config) -> Result<Arc<dyn Storage>, RepositoryError> {
    let storage: Arc<dyn Storage> = match config.storage_backend {
        #[cfg(feature = "document")]
        StorageBackend::Document => {
            Arc::new(document::DocumentStore::open(&config.document_store_path).await?)
        }
        #[cfg(feature = "dynamodb")]
        StorageBackend::DynamoDb => Arc::new(dynamodb::DynamoDbStore::from_config(config).await),
        #[allow(unreachable_patterns)]
        other => {
            return Err(RepositoryError::ConnectionFailed(format!(
                "Storage backend '{other}' is not compiled into this build"
            )))
        }
    };

    tracing::info!(backend = storage.backend_name(), "storage connected");
    Ok(storage)
}
