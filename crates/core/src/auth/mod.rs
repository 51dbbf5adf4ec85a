//! OTP login domain: challenge records, code hashing and session claims.

mod error;
mod functions;
mod traits;
mod types;

pub use error::AuthError;
pub use functions::{
    check_code, cooldown_remaining, email_to_name, generate_otp_code, hash_code, new_challenge,
    otp_to_record, record_to_otp, OTP_LENGTH,
};
pub use traits::{OtpSender, Result};
pub use types::{Claims, CodeCheck, OtpChallenge};
