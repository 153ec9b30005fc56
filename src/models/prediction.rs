//! Prediction request/response models

use serde::Serialize;
use serde_json::Value;

use super::disaster::{severity_from_confidence, DisasterType};

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("missing 'features' in request body")]
    Missing,

    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("'features' must contain only numbers, found {0}")]
    NotNumeric(String),

    #[error("'features' must not be a ragged array")]
    Ragged,

    #[error("expected {expected} features, got {got}")]
    WrongLength { expected: usize, got: usize },
}

/// Extract the feature vector from a `/predict` body.
///
/// `features` may be a flat list, a nested rectangular list (flattened in
/// row-major order) or a single scalar. Numeric strings and booleans are
/// coerced to numbers.
pub fn parse_features(body: &[u8], expected: usize) -> Result<Vec<f64>, FeatureError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FeatureError::Missing);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| FeatureError::InvalidJson(e.to_string()))?;

    let features = value.get("features").ok_or(FeatureError::Missing)?;

    let mut out = Vec::with_capacity(expected);
    flatten(features, &mut out)?;

    if out.len() != expected {
        return Err(FeatureError::WrongLength { expected, got: out.len() });
    }
    Ok(out)
}

/// Pushes the numbers of `value` onto `out` and returns its shape.
fn flatten(value: &Value, out: &mut Vec<f64>) -> Result<Vec<usize>, FeatureError> {
    match value {
        Value::Array(items) => {
            let mut inner: Option<Vec<usize>> = None;
            for item in items {
                let shape = flatten(item, out)?;
                match &inner {
                    Some(s) if *s != shape => return Err(FeatureError::Ragged),
                    Some(_) => {}
                    None => inner = Some(shape),
                }
            }
            let mut shape = vec![items.len()];
            shape.extend(inner.unwrap_or_default());
            Ok(shape)
        }
        scalar => {
            out.push(coerce(scalar)?);
            Ok(Vec::new())
        }
    }
}

fn coerce(value: &Value) -> Result<f64, FeatureError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|n| n.is_finite())
        .ok_or_else(|| FeatureError::NotNumeric(value.to_string()))
}

/// `/predict` response
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub prediction: usize,
    pub disaster_type: DisasterType,
    pub confidence: f64,
    pub severity: u8,
    pub probabilities: Vec<f64>,
}

impl Prediction {
    pub fn new(disaster_type: DisasterType, index: usize, probabilities: Vec<f64>) -> Self {
        let confidence = probabilities.iter().copied().fold(0.0, f64::max);
        Self {
            prediction: index,
            disaster_type,
            confidence,
            severity: severity_from_confidence(confidence),
            probabilities,
        }
    }
}
