//! Retrain handler (stub)

use crate::{AppError, AppResult};

/// Accepts any payload; retraining is not available in this service.
pub async fn retrain() -> AppResult<()> {
    tracing::info!("Retrain requested but not implemented");
    Err(AppError::NotImplemented("train endpoint not implemented".to_string()))
}
