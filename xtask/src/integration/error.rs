use thiserror::Error;

pub type Result<T> = std::result::Result<T, IntegrationError>;

#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("No container runtime found: {0}")]
    RuntimeNotFound(String),

    #[error("Container operation failed: {0}")]
    ContainerFailed(String),

    #[error("Container '{name}' is not ready after {timeout_secs}s")]
    ContainerNotReady { name: String, timeout_secs: u64 },

    #[error("Table setup failed: {0}")]
    TableSetup(#[from] crate::dynamodb::DynamodbError),

    #[error("Integration tests failed")]
    TestsFailed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
