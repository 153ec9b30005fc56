//! Standard scaler (transform only; fitting happens at training time)

use serde::{Deserialize, Serialize};

use super::{check_dimension, InferenceError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.is_empty() {
            return Err("scaler has no features".to_string());
        }
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err("scaler parameters must be finite".to_string());
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// `(x - mean) / scale`; zero-variance features keep a unit scale.
    pub fn transform(&self, x: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_dimension(self.n_features(), x)?;

        Ok(x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                (v - m) / s
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform() {
        let scaler = StandardScaler {
            mean: vec![1.0, 2.0, 0.0],
            scale: vec![2.0, 0.5, 0.0],
        };
        let out = scaler.transform(&[3.0, 1.0, 4.0]).unwrap();
        assert_eq!(out, vec![1.0, -2.0, 4.0]);
    }

    #[test]
    fn test_transform_wrong_length() {
        let scaler = StandardScaler { mean: vec![0.0; 5], scale: vec![1.0; 5] };
        assert!(matches!(
            scaler.transform(&[1.0, 2.0]),
            Err(InferenceError::DimensionMismatch { expected: 5, got: 2 })
        ));
    }

    #[test]
    fn test_validate() {
        let ok = StandardScaler { mean: vec![0.0; 3], scale: vec![1.0; 3] };
        assert!(ok.validate().is_ok());

        let uneven = StandardScaler { mean: vec![0.0; 3], scale: vec![1.0; 2] };
        assert!(uneven.validate().is_err());

        let nan = StandardScaler { mean: vec![f64::NAN], scale: vec![1.0] };
        assert!(nan.validate().is_err());
    }
}
