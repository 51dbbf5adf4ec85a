//! Document store backend.
//!
//! Each entity type lives in its own collection (a SQLite table named after
//! the type), with records stored whole as JSON. Queries on GSI attributes
//! go through SQLite's JSON functions.

mod error;
mod repository;
mod sql;

pub use repository::DocumentStore;
