//! Service banner

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn index(State(state): State<AppState>) -> Json<Value> {
    let model = state.model.get().map(|m| &m.metadata);

    Json(json!({
        "service": "Disaster Prediction ML Service",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "model_ready": state.model.is_ready(),
        "model_status": state.model.status(),
        "model": model,
        "load_error": state.model.failure(),
        "endpoints": {
            "health": "/health",
            "predict": "/predict (POST)",
            "train": "/train (POST)"
        },
        "usage": {
            "predict": "POST /predict with {\"features\": [0.1, 0.2, 0.3, 0.4, 0.5]}",
            "health": "GET /health"
        }
    }))
}
