//! HTTP handlers

pub mod home;
pub mod health;
pub mod predict;
pub mod train;

use axum::http::Uri;

use crate::AppError;

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
