//! Axum extractors for authentication and role guards.

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use peeth_core::auth::AuthError as CoreError;
use peeth_core::users::{Role, User};

use crate::error::AuthError;
use crate::AuthState;

/// Bearer token from the `Authorization` header, if present.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AuthError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = header
        .to_str()
        .map_err(|_| CoreError::InvalidToken("invalid authorization header".to_string()))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(CoreError::InvalidToken("expected a Bearer token".to_string()).into()),
    }
}

/// Extractor for authenticated user. Returns 401 if not authenticated.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let token = bearer_token(parts)?.ok_or(CoreError::MissingToken)?;
        let user = auth_state.service.current_user(token).await?;
        Ok(CurrentUser(user))
    }
}

/// Extractor for optionally authenticated user. Returns None if not authenticated.
pub struct OptionalUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = match bearer_token(parts) {
            Ok(Some(token)) => token,
            _ => return Ok(OptionalUser(None)),
        };

        match auth_state.service.current_user(token).await {
            Ok(user) => Ok(OptionalUser(Some(user))),
            Err(AuthError::Core(_)) => Ok(OptionalUser(None)),
            // Storage failures are not "anonymous".
            Err(e) => Err(e),
        }
    }
}

/// Minimum role a route requires.
pub trait RequiredRole: Send + Sync + 'static {
    const ROLE: Role;
}

/// `content_editor` and above.
pub struct Editor;

impl RequiredRole for Editor {
    const ROLE: Role = Role::ContentEditor;
}

/// `admin` and above.
pub struct Admin;

impl RequiredRole for Admin {
    const ROLE: Role = Role::Admin;
}

pub struct SuperAdmin;

impl RequiredRole for SuperAdmin {
    const ROLE: Role = Role::SuperAdmin;
}

/// Authenticated user holding at least `R::ROLE`. 401 without a valid
/// token, 403 with too low a role.
pub struct Authorized<R: RequiredRole> {
    pub user: User,
    _role: PhantomData<R>,
}

impl<R: RequiredRole> Authorized<R> {
    pub fn into_user(self) -> User {
        self.user
    }
}

impl<S, R> FromRequestParts<S> for Authorized<R>
where
    AuthState: FromRef<S>,
    S: Send + Sync,
    R: RequiredRole,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.role.has_privilege(R::ROLE) {
            tracing::debug!(
                user_id = %user.id,
                role = %user.role,
                required = %R::ROLE,
                "access denied"
            );
            return Err(CoreError::Forbidden { required: R::ROLE }.into());
        }

        Ok(Authorized {
            user,
            _role: PhantomData,
        })
    }
}
