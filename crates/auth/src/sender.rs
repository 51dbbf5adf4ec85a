use async_trait::async_trait;
use peeth_core::auth::{OtpSender, Result};

/// Writes login codes to the log instead of sending them.
///
/// Local development only.
#[derive(Debug, Clone, Default)]
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send_code(&self, email: &str, code: &str) -> Result<()> {
        tracing::info!(email = %email, code = %code, "login code (not delivered)");
        Ok(())
    }
}
