//! HS256 session tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use peeth_core::auth::{AuthError as CoreError, Claims};
use peeth_core::users::User;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Signs a session token for the user. Returns the token and its expiry.
pub fn issue_token(
    user: &User,
    config: &AuthConfig,
    now: DateTime<Utc>,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let ttl = Duration::from_std(config.token_ttl)
        .map_err(|e| AuthError::Config(format!("token TTL out of range: {e}")))?;
    let expires_at = now + ttl;

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.token_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))?;

    Ok((token, expires_at))
}

/// Checks signature and expiry and returns the claims.
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.token_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => CoreError::TokenExpired,
        _ => CoreError::InvalidToken(e.to_string()),
    })?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use peeth_core::users::Role;

    fn config() -> AuthConfig {
        AuthConfig::new("test-secret-that-is-long-enough-for-hmac")
    }

    #[test]
    fn issued_token_verifies() {
        let user = User::new("seva@peeth.org").with_role(Role::ContentEditor);
        let now = Utc::now();

        let (token, expires_at) = issue_token(&user, &config(), now).unwrap();
        let claims = verify_token(&token, &config()).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::ContentEditor);
        assert_eq!(claims.exp, expires_at.timestamp());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let user = User::new("seva@peeth.org");
        // Well past the default 60 second leeway.
        let issued = Utc::now() - Duration::hours(25);

        let (token, _) = issue_token(&user, &config(), issued).unwrap();

        assert!(matches!(
            verify_token(&token, &config()),
            Err(AuthError::Core(CoreError::TokenExpired))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let user = User::new("seva@peeth.org");
        let (token, _) =
            issue_token(&user, &AuthConfig::new("another-secret"), Utc::now()).unwrap();

        assert!(matches!(
            verify_token(&token, &config()),
            Err(AuthError::Core(CoreError::InvalidToken(_)))
        ));
        assert!(matches!(
            verify_token("not.a.token", &config()),
            Err(AuthError::Core(CoreError::InvalidToken(_)))
        ));
    }
}
