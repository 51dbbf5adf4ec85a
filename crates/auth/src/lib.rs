//! Email OTP login for peeth.
//!
//! This crate provides:
//! - The OTP challenge flow over the shared storage backend
//! - Locally issued HS256 session tokens
//! - Axum extractors for authentication and role guards

mod config;
mod error;
mod extractors;
mod handlers;
mod sender;
mod service;
mod state;
mod tokens;

#[cfg(test)]
mod testing;

pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::{
    Admin, Authorized, CurrentUser, Editor, OptionalUser, RequiredRole, SuperAdmin,
};
pub use handlers::auth_routes;
pub use sender::LogOtpSender;
pub use service::{AuthService, LoginResponse};
pub use state::AuthState;
pub use tokens::{issue_token, verify_token};
