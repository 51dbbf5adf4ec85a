use std::{env, fmt, str::FromStr};

/// Which storage backend serves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Document collections in a local SQLite file (development).
    Document,
    /// Single DynamoDB table with GSI1/GSI2 (production).
    DynamoDb,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "document" | "local" | "sqlite" => Ok(StorageBackend::Document),
            "dynamodb" | "dynamo" => Ok(StorageBackend::DynamoDb),
            other => Err(format!("Unknown storage backend: {other}")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Document => f.write_str("document"),
            StorageBackend::DynamoDb => f.write_str("dynamodb"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    /// SQLite file backing the document store (default: "peeth.db")
    pub document_store_path: String,
    /// DynamoDB table name (default: "peeth-<deployment mode>")
    pub dynamodb_table_name: String,
    /// Endpoint override for DynamoDB Local
    pub aws_endpoint_url: Option<String>,
    pub aws_region: Option<String>,
    /// `development`, `staging` or `production` (default: "development")
    pub deployment_mode: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `STORAGE_BACKEND` - `document` or `dynamodb`. Defaults to `dynamodb`
    ///   in production and `document` everywhere else.
    /// - `DOCUMENT_STORE_PATH` - SQLite path (default: "peeth.db")
    /// - `DYNAMODB_TABLE_NAME` - table name (default: "peeth-<DEPLOYMENT_MODE>")
    /// - `AWS_ENDPOINT_URL` - optional endpoint override
    /// - `AWS_REGION` - optional region override
    /// - `DEPLOYMENT_MODE` - default: "development"
    pub fn from_env() -> Result<Self, String> {
        let deployment_mode =
            env::var("DEPLOYMENT_MODE").unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => default_backend(&deployment_mode),
        };

        Ok(Self {
            storage_backend,
            document_store_path: env::var("DOCUMENT_STORE_PATH")
                .unwrap_or_else(|_| "peeth.db".to_string()),
            dynamodb_table_name: env::var("DYNAMODB_TABLE_NAME")
                .unwrap_or_else(|_| format!("peeth-{deployment_mode}")),
            aws_endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            deployment_mode,
        })
    }

    pub fn is_production(&self) -> bool {
        self.deployment_mode == "production"
    }
}

fn default_backend(deployment_mode: &str) -> StorageBackend {
    if deployment_mode == "production" {
        StorageBackend::DynamoDb
    } else {
        StorageBackend::Document
    }
}
