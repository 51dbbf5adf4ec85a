//! Application state for auth.

use axum::extract::FromRef;

use crate::config::AuthConfig;
use crate::service::AuthService;

/// Shared state for auth handlers and extractors.
#[derive(Clone)]
pub struct AuthState {
    pub service: AuthService,
}

impl AuthState {
    pub fn new(service: AuthService) -> Self {
        Self { service }
    }

    pub fn config(&self) -> &AuthConfig {
        self.service.config()
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}
