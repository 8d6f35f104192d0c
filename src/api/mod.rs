// API Module - REST surface over the latest report and on-demand checks

pub mod config;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

// Re-export commonly used types
pub use config::{ApiConfig, Permission};
pub use server::ApiServer;
pub use state::AppState;

/// API module version
pub const API_VERSION: &str = "1.0.0";
