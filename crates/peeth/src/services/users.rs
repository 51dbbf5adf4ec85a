use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use peeth_core::error::{ServiceError, ServiceResult};
use peeth_core::keys::{self, USER};
use peeth_core::storage::{
    FieldUpdate, Index, KeyCondition, QueryOptions, RepositoryError, Storage, UpdateOptions,
};
use peeth_core::users::{
    record_to_user, user_to_record, CreateUserRequest, Role, User, UserRepository,
};

use super::{ensure_unique, find_by_gsi2, query_all};

/// Site users. Also serves the login flow through [`UserRepository`].
#[derive(Clone)]
pub struct UserService {
    storage: Arc<dyn Storage>,
}

impl UserService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Validates the request, then creates the user.
    pub async fn register(&self, request: CreateUserRequest) -> ServiceResult<User> {
        let user = request.into_user()?;
        self.create_user(user).await
    }

    /// Every user, oldest first.
    pub async fn list_users(&self) -> ServiceResult<Vec<User>> {
        let options = QueryOptions::new(Index::Gsi1, KeyCondition::partition(USER));
        let records = query_all(self.storage.as_ref(), USER, options).await?;
        Ok(records
            .into_iter()
            .map(record_to_user)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn require_user(&self, id: Uuid) -> ServiceResult<User> {
        self.get_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER, id))
    }

    pub async fn update_role(&self, id: Uuid, role: Role) -> ServiceResult<User> {
        let user = self
            .update_fields(id, FieldUpdate::new().set("role", role.as_str()))
            .await?;
        tracing::info!(user_id = %id, role = %role, "user role changed");
        Ok(user)
    }

    pub async fn delete_user(&self, id: Uuid) -> ServiceResult<()> {
        self.require_user(id).await?;
        self.storage.delete(&keys::user_key(id)).await?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Makes sure `email` belongs to a super admin, creating or promoting
    /// the user. Used to bootstrap a fresh table.
    pub async fn ensure_super_admin(&self, email: &str) -> ServiceResult<User> {
        match self.get_user_by_email(email).await? {
            Some(user) if user.role == Role::SuperAdmin => Ok(user),
            Some(user) => self.update_role(user.id, Role::SuperAdmin).await,
            None => {
                self.register(CreateUserRequest::new(email).with_role(Role::SuperAdmin))
                    .await
            }
        }
    }

    async fn update_fields(&self, id: Uuid, update: FieldUpdate) -> ServiceResult<User> {
        let result = self
            .storage
            .update(USER, UpdateOptions::new(keys::user_key(id), update))
            .await;

        match result {
            Ok(record) => Ok(record_to_user(record)?),
            Err(RepositoryError::NotFound { .. }) => Err(ServiceError::not_found(USER, id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl UserRepository for UserService {
    async fn get_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        let record = self.storage.get(&keys::user_key(id)).await?;
        Ok(record.map(record_to_user).transpose()?)
    }

    async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let record = find_by_gsi2(self.storage.as_ref(), USER, keys::email_gsi2_pk(email)).await?;
        Ok(record.map(record_to_user).transpose()?)
    }

    async fn create_user(&self, user: User) -> ServiceResult<User> {
        ensure_unique(
            self.storage.as_ref(),
            USER,
            keys::email_gsi2_pk(&user.email),
            "email",
            &user.email,
            None,
        )
        .await?;

        let stored = self.storage.put(user_to_record(&user)?).await?;
        let user = record_to_user(stored)?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    async fn touch_login(&self, id: Uuid) -> ServiceResult<User> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::AutoSi, true);
        self.update_fields(id, FieldUpdate::new().set("lastLoginAt", now))
            .await
    }
}
