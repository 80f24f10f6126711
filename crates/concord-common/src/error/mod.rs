//! Error types shared across the gateway crates

mod app_error;

pub use app_error::{AppError, AppResult, ErrorResponse};
