use serde::{Deserialize, Serialize};

use super::types::{Role, User};
use crate::validation::{normalize_email, validate_required, ValidationError};

pub const MAX_NAME_LEN: usize = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl CreateUserRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            role: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Validates and builds the user with a normalized email.
    pub fn into_user(self) -> Result<User, ValidationError> {
        let email = normalize_email(&self.email)?;
        if let Some(name) = &self.name {
            validate_required("name", name, MAX_NAME_LEN)?;
        }
        let mut user = User::new(email).with_role(self.role.unwrap_or_default());
        user.name = self.name;
        Ok(user)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_user_normalizes_email() {
        let user = CreateUserRequest::new(" Guru@Peeth.ORG ")
            .with_role(Role::Admin)
            .into_user()
            .unwrap();
        assert_eq!(user.email, "guru@peeth.org");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_into_user_rejects_bad_email() {
        assert!(matches!(
            CreateUserRequest::new("not-an-email").into_user(),
            Err(ValidationError::InvalidEmail(_))
        ));
    }
}
