//! Inference Engine
//!
//! Classifier seam plus the concrete artifacts the service loads:
//! a random forest and an optional standard scaler.

pub mod forest;
pub mod scaler;

pub use forest::RandomForest;
pub use scaler::StandardScaler;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("classifier produced no probabilities")]
    EmptyOutput,

    #[error("classifier produced non-finite probabilities")]
    NonFinite,

    #[error("class index {0} has no disaster label")]
    UnknownClass(usize),
}

/// Trait for classifiers the prediction service can run.
///
/// Implementations are shared read-only across request tasks.
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;

    fn classes(&self) -> &[String];

    /// Per-class probability distribution for a single sample.
    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, InferenceError>;

    /// Predicted class index (first argmax) together with the distribution.
    fn predict(&self, x: &[f64]) -> Result<(usize, Vec<f64>), InferenceError> {
        let proba = self.predict_proba(x)?;
        let index = argmax(&proba)?;
        Ok((index, proba))
    }
}

/// Index of the first maximum.
pub fn argmax(values: &[f64]) -> Result<usize, InferenceError> {
    if values.is_empty() {
        return Err(InferenceError::EmptyOutput);
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(InferenceError::NonFinite);
    }

    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    Ok(best)
}

fn check_dimension(expected: usize, x: &[f64]) -> Result<(), InferenceError> {
    if x.len() != expected {
        return Err(InferenceError::DimensionMismatch { expected, got: x.len() });
    }
    Ok(())
}
