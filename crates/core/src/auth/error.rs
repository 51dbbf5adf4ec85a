use thiserror::Error;

use crate::users::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid session token: {0}")]
    InvalidToken(String),

    #[error("session token expired")]
    TokenExpired,

    #[error("invalid or expired code")]
    InvalidCode,

    #[error("too many attempts, request a new code")]
    TooManyAttempts,

    #[error("a code was sent recently, retry in {retry_after_secs}s")]
    CooldownActive { retry_after_secs: i64 },

    #[error("requires the {required} role")]
    Forbidden { required: Role },

    #[error("code delivery failed: {0}")]
    Delivery(String),
}
