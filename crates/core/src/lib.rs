//! Functional core of the peeth backend.
//!
//! Pure types and functions only: the storage contract and its query
//! descriptions, the single-table key conventions, the CMS, content and user
//! domain, and OTP challenges. All I/O lives in the `peeth` and `peeth_auth`
//! crates.

pub mod auth;
pub mod cms;
pub mod content;
pub mod error;
pub mod keys;
pub mod storage;
pub mod text;
pub mod users;
pub mod validation;

pub use error::{service_error_to_status_code, ServiceError, ServiceResult};
pub use text::LocalizedText;
