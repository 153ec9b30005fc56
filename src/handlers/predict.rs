//! Prediction handler

use anyhow::Context;
use axum::{body::Bytes, extract::State, Json};

use crate::models::{parse_features, Prediction};
use crate::{AppError, AppResult, AppState};

/// Classify a single feature vector
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<Prediction>> {
    let model = state.model.get().ok_or(AppError::NotReady)?;

    let features = parse_features(&body, model.n_features())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let prediction = model.predict(&features).context("prediction failed")?;

    tracing::debug!(
        disaster_type = %prediction.disaster_type,
        confidence = prediction.confidence,
        severity = prediction.severity,
        "Prediction served"
    );

    Ok(Json(prediction))
}
