//! Site users and their roles.

mod requests;
mod types;

pub use requests::{CreateUserRequest, UpdateRoleRequest, MAX_NAME_LEN};
pub use types::{Role, User};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::keys;
use crate::storage::{Record, Result};

/// User lookups needed by the login flow.
///
/// Implemented by the user service over whichever storage backend is
/// configured; the auth crate depends only on this trait.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a user by their ID.
    async fn get_user(&self, id: Uuid) -> ServiceResult<Option<User>>;

    /// Gets a user by their email address (case-insensitive).
    async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>>;

    /// Creates a new user. Fails with `Duplicate` when the email is taken.
    async fn create_user(&self, user: User) -> ServiceResult<User>;

    /// Records a successful login.
    async fn touch_login(&self, id: Uuid) -> ServiceResult<User>;
}

pub fn user_to_record(user: &User) -> Result<Record> {
    let (gsi1pk, gsi1sk) = keys::user_gsi1(user.created_at, user.id);
    let (gsi2pk, gsi2sk) = keys::user_gsi2(&user.email, user.id);
    Ok(Record::from_entity(keys::user_key(user.id), user)?
        .with_gsi1(gsi1pk, gsi1sk)
        .with_gsi2(gsi2pk, gsi2sk))
}

pub fn record_to_user(record: Record) -> Result<User> {
    record.into_entity()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_indexes_email() {
        let user = User::new("seva@example.org").with_role(Role::ContentEditor);
        let record = user_to_record(&user).unwrap();

        assert_eq!(record.gsi2pk.as_deref(), Some("EMAIL#seva@example.org"));
        assert_eq!(record.get_str("role"), Some("content_editor"));
        assert_eq!(record_to_user(record).unwrap(), user);
    }
}
