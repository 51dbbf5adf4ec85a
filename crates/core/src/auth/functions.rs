use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

use super::{CodeCheck, OtpChallenge};
use crate::keys;
use crate::storage::{Record, Result, TTL};

/// Digits in a login code.
pub const OTP_LENGTH: usize = 6;

/// Generate a zero-padded six digit code.
pub fn generate_otp_code() -> String {
    let code: u32 = rand::rng().random_range(0..1_000_000);
    format!("{code:0width$}", width = OTP_LENGTH)
}

/// SHA-256 hex digest of a code.
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn new_challenge(
    email: &str,
    code: &str,
    now: DateTime<Utc>,
    ttl: Duration,
    max_attempts: u32,
) -> OtpChallenge {
    OtpChallenge {
        email: email.to_lowercase(),
        code_hash: hash_code(code),
        requested_at: now,
        expires_at: now + ttl,
        attempts: 0,
        max_attempts,
    }
}

/// Time left before another code may be requested, if any.
pub fn cooldown_remaining(
    challenge: &OtpChallenge,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Option<Duration> {
    let available_at = challenge.requested_at + cooldown;
    (available_at > now).then(|| available_at - now)
}

/// Compares a submitted code. Exhaustion wins over expiry, expiry over a
/// match.
pub fn check_code(challenge: &OtpChallenge, code: &str, now: DateTime<Utc>) -> CodeCheck {
    if challenge.attempts >= challenge.max_attempts {
        CodeCheck::Exhausted
    } else if challenge.expires_at <= now {
        CodeCheck::Expired
    } else if hash_code(code.trim()) == challenge.code_hash {
        CodeCheck::Valid
    } else {
        CodeCheck::Mismatch
    }
}

/// Extract username from email if no name provided.
pub fn email_to_name(email: &str) -> String {
    match email.split('@').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "User".to_string(),
    }
}

pub fn otp_to_record(challenge: &OtpChallenge) -> Result<Record> {
    Ok(Record::from_entity(keys::otp_key(&challenge.email), challenge)?
        .with_attribute(TTL, challenge.expires_at.timestamp()))
}

pub fn record_to_otp(record: Record) -> Result<OtpChallenge> {
    record.into_entity()
}
