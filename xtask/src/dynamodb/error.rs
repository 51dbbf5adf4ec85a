use thiserror::Error;

pub type Result<T> = std::result::Result<T, DynamodbError>;

#[derive(Error, Debug)]
pub enum DynamodbError {
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("Timeout waiting for table '{table_name}' to become active")]
    TableActivationTimeout { table_name: String },

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl DynamodbError {
    /// Flattens any SDK error, including builder errors, into a message.
    pub fn aws(err: impl std::fmt::Display) -> Self {
        Self::AwsSdk(err.to_string())
    }
}
