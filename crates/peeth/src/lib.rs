//! HTTP server and storage backends for the peeth website.

pub mod app;
pub mod config;
pub mod handlers;
pub mod services;
pub mod state;
pub mod storage;

pub use app::create_app;
pub use config::Config;
pub use state::AppState;
