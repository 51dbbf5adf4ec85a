pub mod cms;
pub mod content;
pub mod error;
pub mod health;
pub mod users;

pub use error::AppError;

use peeth_auth::OptionalUser;
use peeth_core::users::Role;

/// Whether the caller may see drafts and hidden components.
fn can_edit(user: &OptionalUser) -> bool {
    user.0
        .as_ref()
        .is_some_and(|user| user.role.has_privilege(Role::ContentEditor))
}
