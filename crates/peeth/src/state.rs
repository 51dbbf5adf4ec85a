//! Shared application state.
//!
//! One storage handle is opened at startup and shared by every service and
//! by the auth flow.

use std::sync::Arc;

use peeth_auth::{AuthConfig, AuthService, AuthState};
use peeth_core::auth::OtpSender;
use peeth_core::storage::{RepositoryError, Storage};

use crate::config::Config;
use crate::services::{CmsService, ContentService, UserService};
use crate::storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub cms: CmsService,
    pub content: ContentService,
    pub users: UserService,
    pub auth: AuthState,
}

impl AppState {
    /// Builds every service over an already opened backend.
    pub fn new(
        storage: Arc<dyn Storage>,
        auth_config: AuthConfig,
        sender: Arc<dyn OtpSender>,
    ) -> Self {
        let users = UserService::new(storage.clone());
        let auth = AuthService::new(
            storage.clone(),
            Arc::new(users.clone()),
            sender,
            auth_config,
        );

        Self {
            cms: CmsService::new(storage.clone()),
            content: ContentService::new(storage.clone()),
            users,
            auth: AuthState::new(auth),
            storage,
        }
    }

    /// Opens the configured backend, then builds the state.
    pub async fn connect(
        config: &Config,
        auth_config: AuthConfig,
        sender: Arc<dyn OtpSender>,
    ) -> Result<Self, RepositoryError> {
        let storage = storage::connect(config).await?;
        Ok(Self::new(storage, auth_config, sender))
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}
