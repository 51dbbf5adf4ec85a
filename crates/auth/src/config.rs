use std::time::Duration;

use rand::{distr::Alphanumeric, Rng};

use crate::error::AuthError;

const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;
const DEFAULT_OTP_TTL_SECONDS: u64 = 300;
const DEFAULT_OTP_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_OTP_COOLDOWN_SECONDS: u64 = 60;

/// Complete auth configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for session tokens.
    pub token_secret: String,
    pub token_ttl: Duration,
    pub otp_ttl: Duration,
    pub otp_max_attempts: u32,
    /// Minimum gap between two code requests for the same email.
    pub otp_cooldown: Duration,
}

impl AuthConfig {
    /// Config with default lifetimes and the given secret.
    pub fn new(token_secret: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_HOURS * 60 * 60),
            otp_ttl: Duration::from_secs(DEFAULT_OTP_TTL_SECONDS),
            otp_max_attempts: DEFAULT_OTP_MAX_ATTEMPTS,
            otp_cooldown: Duration::from_secs(DEFAULT_OTP_COOLDOWN_SECONDS),
        }
    }

    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AUTH_TOKEN_SECRET`: HS256 signing secret. When unset a random one is
    ///   generated and tokens stop working after a restart.
    /// - `AUTH_TOKEN_TTL_HOURS`: Session token lifetime (default: 24)
    /// - `OTP_TTL_SECONDS`: Code lifetime (default: 300)
    /// - `OTP_MAX_ATTEMPTS`: Wrong guesses before a code is voided (default: 5)
    /// - `OTP_COOLDOWN_SECONDS`: Gap between code requests (default: 60)
    ///
    /// # Errors
    ///
    /// Returns `Config` if a variable is set but does not parse.
    pub fn from_env() -> Result<Self, AuthError> {
        let token_secret = match std::env::var("AUTH_TOKEN_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("AUTH_TOKEN_SECRET not set, using a random secret for this process");
                random_secret()
            }
        };

        let defaults = Self::new(token_secret);

        Ok(Self {
            token_ttl: env_number("AUTH_TOKEN_TTL_HOURS")?
                .map(|hours: u64| Duration::from_secs(hours * 60 * 60))
                .unwrap_or(defaults.token_ttl),
            otp_ttl: env_number("OTP_TTL_SECONDS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.otp_ttl),
            otp_max_attempts: env_number("OTP_MAX_ATTEMPTS")?.unwrap_or(defaults.otp_max_attempts),
            otp_cooldown: env_number("OTP_COOLDOWN_SECONDS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.otp_cooldown),
            ..defaults
        })
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>, AuthError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AuthError::Config(format!("{name} must be a non-negative integer"))),
        Err(_) => Ok(None),
    }
}

fn random_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
