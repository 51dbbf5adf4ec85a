//! The OTP login flow.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use peeth_core::auth::{
    check_code, cooldown_remaining, email_to_name, generate_otp_code, new_challenge,
    otp_to_record, record_to_otp, AuthError as CoreError, CodeCheck, OtpChallenge, OtpSender,
};
use peeth_core::keys::{self, OTP};
use peeth_core::storage::{FieldUpdate, RecordKey, RepositoryError, Storage, UpdateOptions};
use peeth_core::users::{User, UserRepository};
use peeth_core::validation::normalize_email;
use peeth_core::ServiceError;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::tokens::{issue_token, verify_token};

/// Returned by a successful code verification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Issues and verifies login codes, and resolves session tokens to users.
///
/// Challenges live in the shared storage as `OTP#<email>` records, so any
/// instance can verify a code another one issued.
#[derive(Clone)]
pub struct AuthService {
    storage: Arc<dyn Storage>,
    users: Arc<dyn UserRepository>,
    sender: Arc<dyn OtpSender>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        storage: Arc<dyn Storage>,
        users: Arc<dyn UserRepository>,
        sender: Arc<dyn OtpSender>,
        config: AuthConfig,
    ) -> Self {
        Self {
            storage,
            users,
            sender,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Stores a fresh challenge for `email` and sends the code.
    ///
    /// A new request replaces the previous challenge, unless it came within
    /// the cooldown.
    pub async fn request_otp(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email).map_err(ServiceError::from)?;
        let key = keys::otp_key(&email);
        let now = Utc::now();

        if let Some(existing) = self.load_challenge(&key).await? {
            let cooldown = to_chrono(self.config.otp_cooldown)?;
            if let Some(remaining) = cooldown_remaining(&existing, now, cooldown) {
                return Err(CoreError::CooldownActive {
                    retry_after_secs: ceil_seconds(remaining),
                }
                .into());
            }
        }

        let code = generate_otp_code();
        let challenge = new_challenge(
            &email,
            &code,
            now,
            to_chrono(self.config.otp_ttl)?,
            self.config.otp_max_attempts,
        );
        self.storage.put(otp_to_record(&challenge)?).await?;
        self.sender.send_code(&email, &code).await?;

        tracing::info!(email = %email, expires_at = %challenge.expires_at, "login code issued");
        Ok(())
    }

    /// Consumes the challenge for `email` and signs a session token.
    ///
    /// A wrong code counts an attempt; the attempt that reaches the maximum
    /// deletes the challenge. The first successful login creates the user.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(email).map_err(ServiceError::from)?;
        let key = keys::otp_key(&email);
        let now = Utc::now();

        let challenge = self
            .load_challenge(&key)
            .await?
            .ok_or(CoreError::InvalidCode)?;

        match check_code(&challenge, code, now) {
            CodeCheck::Valid => self.storage.delete(&key).await?,
            CodeCheck::Expired => {
                self.storage.delete(&key).await?;
                return Err(CoreError::InvalidCode.into());
            }
            CodeCheck::Exhausted => {
                self.storage.delete(&key).await?;
                return Err(CoreError::TooManyAttempts.into());
            }
            CodeCheck::Mismatch => return Err(self.record_failed_attempt(&key, &email).await),
        }

        let user = match self.users.get_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                let user = User::new(&email).with_name(email_to_name(&email));
                self.users.create_user(user).await?
            }
        };
        let user = self.users.touch_login(user.id).await?;

        let (token, expires_at) = issue_token(&user, &self.config, now)?;
        tracing::info!(user_id = %user.id, "login succeeded");

        Ok(LoginResponse {
            token,
            expires_at,
            user,
        })
    }

    /// Resolves a session token to the stored user.
    ///
    /// The role comes from storage, not the token, so role changes apply
    /// immediately.
    pub async fn current_user(&self, token: &str) -> Result<User, AuthError> {
        let claims = verify_token(token, &self.config)?;
        self.users
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| CoreError::InvalidToken("user no longer exists".to_string()).into())
    }

    async fn load_challenge(&self, key: &RecordKey) -> Result<Option<OtpChallenge>, AuthError> {
        let record = self.storage.get(key).await?;
        Ok(record.map(record_to_otp).transpose()?)
    }

    /// Counts a wrong guess and returns the error to report.
    async fn record_failed_attempt(&self, key: &RecordKey, email: &str) -> AuthError {
        let update = UpdateOptions::new(key.clone(), FieldUpdate::new().increment("attempts", 1));

        let challenge = match self.storage.update(OTP, update).await {
            Ok(record) => match record_to_otp(record) {
                Ok(challenge) => challenge,
                Err(e) => return e.into(),
            },
            // Consumed or voided by a concurrent request.
            Err(RepositoryError::NotFound { .. }) => return CoreError::InvalidCode.into(),
            Err(e) => return e.into(),
        };

        if challenge.attempts < challenge.max_attempts {
            return CoreError::InvalidCode.into();
        }

        tracing::warn!(email = %email, attempts = challenge.attempts, "login code voided");
        match self.storage.delete(key).await {
            Ok(()) => CoreError::TooManyAttempts.into(),
            Err(e) => e.into(),
        }
    }
}

fn to_chrono(duration: std::time::Duration) -> Result<Duration, AuthError> {
    Duration::from_std(duration)
        .map_err(|e| AuthError::Config(format!("duration out of range: {e}")))
}

fn ceil_seconds(duration: Duration) -> i64 {
    (duration.num_milliseconds() + 999) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CapturingSender, MemoryStorage, MemoryUsers};
    use peeth_core::users::Role;

    struct Harness {
        auth: AuthService,
        storage: Arc<MemoryStorage>,
        users: Arc<MemoryUsers>,
        sender: Arc<CapturingSender>,
    }

    fn harness(config: AuthConfig) -> Harness {
        let storage = Arc::new(MemoryStorage::default());
        let users = Arc::new(MemoryUsers::default());
        let sender = Arc::new(CapturingSender::default());
        let auth = AuthService::new(storage.clone(), users.clone(), sender.clone(), config);
        Harness {
            auth,
            storage,
            users,
            sender,
        }
    }

    fn config() -> AuthConfig {
        let mut config = AuthConfig::new("test-secret");
        config.otp_max_attempts = 3;
        config.otp_cooldown = std::time::Duration::ZERO;
        config
    }

    fn wrong_code(code: &str) -> String {
        if code == "000000" {
            "111111".to_string()
        } else {
            "000000".to_string()
        }
    }

    #[tokio::test]
    async fn correct_code_logs_in_once() {
        let h = harness(config());
        h.auth.request_otp("Seva@Peeth.org").await.unwrap();
        let code = h.sender.last_code("seva@peeth.org").unwrap();

        let login = h.auth.verify_otp("seva@peeth.org", &code).await.unwrap();
        assert_eq!(login.user.email, "seva@peeth.org");
        assert_eq!(login.user.role, Role::User);
        assert!(login.user.last_login_at.is_some());

        let again = h.auth.verify_otp("seva@peeth.org", &code).await;
        assert!(matches!(again, Err(AuthError::Core(CoreError::InvalidCode))));
    }

    #[tokio::test]
    async fn first_login_creates_user_and_later_logins_reuse_it() {
        let h = harness(config());

        h.auth.request_otp("guru@peeth.org").await.unwrap();
        let code = h.sender.last_code("guru@peeth.org").unwrap();
        let first = h.auth.verify_otp("guru@peeth.org", &code).await.unwrap();

        h.auth.request_otp("guru@peeth.org").await.unwrap();
        let code = h.sender.last_code("guru@peeth.org").unwrap();
        let second = h.auth.verify_otp("guru@peeth.org", &code).await.unwrap();

        assert_eq!(first.user.id, second.user.id);
        assert_eq!(h.users.count(), 1);
        assert_eq!(first.user.name.as_deref(), Some("guru"));
    }

    #[tokio::test]
    async fn attempts_never_exceed_maximum() {
        let h = harness(config());
        h.auth.request_otp("seva@peeth.org").await.unwrap();
        let code = h.sender.last_code("seva@peeth.org").unwrap();
        let wrong = wrong_code(&code);

        for _ in 0..2 {
            let result = h.auth.verify_otp("seva@peeth.org", &wrong).await;
            assert!(matches!(result, Err(AuthError::Core(CoreError::InvalidCode))));
        }
        let stored = h.storage.get(&keys::otp_key("seva@peeth.org")).await.unwrap();
        assert_eq!(stored.and_then(|r| r.get_i64("attempts")), Some(2));

        let third = h.auth.verify_otp("seva@peeth.org", &wrong).await;
        assert!(matches!(third, Err(AuthError::Core(CoreError::TooManyAttempts))));

        // Voided: even the right code fails now.
        assert!(h
            .storage
            .get(&keys::otp_key("seva@peeth.org"))
            .await
            .unwrap()
            .is_none());
        assert!(h.auth.verify_otp("seva@peeth.org", &code).await.is_err());
    }

    #[tokio::test]
    async fn cooldown_blocks_rapid_requests() {
        let mut config = config();
        config.otp_cooldown = std::time::Duration::from_secs(60);
        let h = harness(config);

        h.auth.request_otp("seva@peeth.org").await.unwrap();
        let result = h.auth.request_otp("SEVA@peeth.org").await;

        match result {
            Err(AuthError::Core(CoreError::CooldownActive { retry_after_secs })) => {
                assert!(retry_after_secs > 0 && retry_after_secs <= 60);
            }
            other => panic!("expected cooldown, got {other:?}"),
        }
        assert_eq!(h.sender.sent_count(), 1);
    }

    #[tokio::test]
    async fn expired_code_is_rejected_and_removed() {
        let mut config = config();
        config.otp_ttl = std::time::Duration::ZERO;
        let h = harness(config);

        h.auth.request_otp("seva@peeth.org").await.unwrap();
        let code = h.sender.last_code("seva@peeth.org").unwrap();

        let result = h.auth.verify_otp("seva@peeth.org", &code).await;
        assert!(matches!(result, Err(AuthError::Core(CoreError::InvalidCode))));
        assert!(h
            .storage
            .get(&keys::otp_key("seva@peeth.org"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn invalid_email_is_bad_request() {
        let h = harness(config());
        let result = h.auth.request_otp("not-an-email").await;
        assert!(matches!(
            result,
            Err(AuthError::Service(ServiceError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn current_user_reads_role_from_storage() {
        let h = harness(config());
        h.auth.request_otp("seva@peeth.org").await.unwrap();
        let code = h.sender.last_code("seva@peeth.org").unwrap();
        let login = h.auth.verify_otp("seva@peeth.org", &code).await.unwrap();

        h.users.set_role(login.user.id, Role::Admin);

        let user = h.auth.current_user(&login.token).await.unwrap();
        assert_eq!(user.role, Role::Admin);

        h.users.remove(login.user.id);
        assert!(matches!(
            h.auth.current_user(&login.token).await,
            Err(AuthError::Core(CoreError::InvalidToken(_)))
        ));
    }
}
