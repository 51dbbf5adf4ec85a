use async_trait::async_trait;

use super::AuthError;

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Delivers one-time codes to a user. Email, SMS or a log line.
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send_code(&self, email: &str, code: &str) -> Result<()>;
}
