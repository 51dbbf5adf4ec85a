//! DynamoDB storage backend.
//!
//! Production backend over the single table provisioned by
//! `cargo xtask dynamodb deploy`.

mod conversions;
mod error;
mod repository;

pub use repository::DynamoDbStore;
