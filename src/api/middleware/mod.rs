// Middleware Module

pub mod auth;
pub mod cors;
pub mod logging;

pub use auth::{AuthExtension, authenticate, require_operator};
pub use cors::cors_layer;
pub use logging::logging_layer;
