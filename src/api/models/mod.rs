// API Models Module

pub mod error;
pub mod response;

pub use error::{ApiError, ApiErrorResponse};
pub use response::{CheckResponse, DeliveryResponse, HealthResponse};
