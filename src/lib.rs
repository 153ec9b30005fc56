//! Disaster Prediction ML Service
//!
//! Serves disaster-type predictions from a random forest loaded at startup.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 DISASTER PREDICTION SERVICE              │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   reads    ┌──────────────────────────┐ │
//! │  │  Handlers   │ ─────────▶ │  ModelSlot (write-once)  │ │
//! │  │  (Axum)     │            └────────────▲─────────────┘ │
//! │  └─────────────┘                         │ publish       │
//! │                             ┌────────────┴─────────────┐ │
//! │                             │  Loader (blocking task)  │ │
//! │                             └────────────▲─────────────┘ │
//! │                                          │               │
//! │                           model.json / scaler.json       │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod loader;
pub mod models;

use std::any::Any;
use std::sync::Arc;

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult};

use config::Config;
use loader::ModelSlot;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub model: Arc<ModelSlot>,
}

impl AppState {
    /// State with an empty slot; the loader fills it in later.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            model: Arc::new(ModelSlot::new()),
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home::index))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/train", post(handlers::train::retrain))
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin)
        )
        .with_state(state)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}
