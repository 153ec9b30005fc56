//! Model loader
//!
//! Reads the classifier and the optional scaler once at startup on a
//! blocking task and publishes them into a write-once [`ModelSlot`].
//! A classifier failure leaves the service permanently not ready; a scaler
//! failure only disables scaling.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;

use crate::inference::{Classifier, InferenceError, RandomForest, StandardScaler};
use crate::models::{DisasterType, Prediction, FEATURE_COUNT};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl LoadError {
    fn is_missing(&self) -> bool {
        matches!(self, LoadError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Model metadata
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub scaler_path: Option<String>,
    pub n_estimators: usize,
    pub checksum: String,
    pub loaded_at: DateTime<Utc>,
}

/// Classifier and scaler as published by the loader. Read-only afterwards.
pub struct LoadedModel {
    pub classifier: Box<dyn Classifier>,
    pub scaler: Option<StandardScaler>,
    pub metadata: ModelMetadata,
}

impl LoadedModel {
    pub fn n_features(&self) -> usize {
        self.classifier.n_features()
    }

    /// Scale (if configured), classify and map the result onto a label.
    pub fn predict(&self, features: &[f64]) -> Result<Prediction, InferenceError> {
        let scaled;
        let input = match &self.scaler {
            Some(scaler) => {
                scaled = scaler.transform(features)?;
                scaled.as_slice()
            }
            None => features,
        };

        let (index, probabilities) = self.classifier.predict(input)?;
        let disaster_type = DisasterType::from_index(index)
            .ok_or(InferenceError::UnknownClass(index))?;

        Ok(Prediction::new(disaster_type, index, probabilities))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed,
}

/// Write-once holder for the loaded model. Readiness is exactly "the cell is
/// set", so readers never see a flag without the model behind it.
#[derive(Default)]
pub struct ModelSlot {
    model: OnceLock<LoadedModel>,
    failure: OnceLock<String>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&LoadedModel> {
        self.model.get()
    }

    pub fn is_ready(&self) -> bool {
        self.model.get().is_some()
    }

    /// Cause of the failed load, if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.get().map(String::as_str)
    }

    pub fn status(&self) -> LoadStatus {
        if self.is_ready() {
            LoadStatus::Ready
        } else if self.failure.get().is_some() {
            LoadStatus::Failed
        } else {
            LoadStatus::Loading
        }
    }

    /// Returns false if a model or a failure was already recorded.
    pub fn publish(&self, model: LoadedModel) -> bool {
        if self.failure.get().is_some() {
            return false;
        }
        self.model.set(model).is_ok()
    }

    pub fn record_failure(&self, reason: String) -> bool {
        if self.is_ready() {
            return false;
        }
        self.failure.set(reason).is_ok()
    }
}

/// Load and validate both artifacts from disk.
pub fn load_artifacts(model_path: &Path, scaler_path: &Path) -> Result<LoadedModel, LoadError> {
    let bytes = std::fs::read(model_path).map_err(|source| LoadError::Io {
        path: model_path.to_path_buf(),
        source,
    })?;
    let checksum = format!("{:x}", Sha256::digest(&bytes));

    let forest: RandomForest = serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse {
        path: model_path.to_path_buf(),
        source,
    })?;

    let invalid = |reason: String| LoadError::Invalid {
        path: model_path.to_path_buf(),
        reason,
    };
    forest.validate().map_err(invalid)?;

    if forest.n_features != FEATURE_COUNT {
        return Err(invalid(format!(
            "model expects {} features, service provides {}",
            forest.n_features, FEATURE_COUNT
        )));
    }
    if !DisasterType::matches_labels(forest.classes()) {
        return Err(invalid(format!(
            "model classes {:?} do not match disaster labels {:?}",
            forest.classes,
            DisasterType::ALL.map(|d| d.as_str())
        )));
    }

    let scaler = match load_scaler(scaler_path, forest.n_features) {
        Ok(scaler) => {
            tracing::info!("Scaler loaded from {}", scaler_path.display());
            Some(scaler)
        }
        Err(e) if e.is_missing() => {
            tracing::info!("No scaler found at {}, using raw features", scaler_path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Ignoring scaler ({}), using raw features", e);
            None
        }
    };

    let metadata = ModelMetadata {
        model_path: model_path.display().to_string(),
        scaler_path: scaler.as_ref().map(|_| scaler_path.display().to_string()),
        n_estimators: forest.n_estimators(),
        checksum,
        loaded_at: Utc::now(),
    };

    Ok(LoadedModel {
        classifier: Box::new(forest),
        scaler,
        metadata,
    })
}

fn load_scaler(path: &Path, n_features: usize) -> Result<StandardScaler, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let scaler: StandardScaler = serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let invalid = |reason: String| LoadError::Invalid {
        path: path.to_path_buf(),
        reason,
    };
    scaler.validate().map_err(invalid)?;

    if scaler.n_features() != n_features {
        return Err(invalid(format!(
            "scaler has {} features, model expects {}",
            scaler.n_features(),
            n_features
        )));
    }
    Ok(scaler)
}

/// One-shot load into `slot`. Never panics; failures are logged and recorded.
pub fn load_model(model_path: &Path, scaler_path: &Path, slot: &ModelSlot) {
    tracing::info!("Loading model from {} ...", model_path.display());

    match load_artifacts(model_path, scaler_path) {
        Ok(model) => {
            tracing::info!(
                trees = model.metadata.n_estimators,
                checksum = %model.metadata.checksum,
                scaled = model.scaler.is_some(),
                "Model loaded successfully"
            );
            if !slot.publish(model) {
                tracing::warn!("Model slot already settled ({:?}); discarding newly loaded model", slot.status());
            }
        }
        Err(e) => {
            tracing::error!("Error loading model: {}", e);
            if !slot.record_failure(e.to_string()) {
                tracing::warn!("Model slot already settled ({:?}); load failure not recorded", slot.status());
            }
        }
    }
}

/// Start the load in the background so the server can accept connections
/// immediately.
pub fn spawn_load(model_path: PathBuf, scaler_path: PathBuf, slot: Arc<ModelSlot>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || load_model(&model_path, &scaler_path, &slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn forest_json() -> serde_json::Value {
        json!({
            "n_features": 5,
            "classes": ["Earthquake", "Flood", "Hurricane", "Tornado", "Wildfire"],
            "trees": [{"nodes": [
                {"split": {"feature": 2, "threshold": 0.0, "left": 1, "right": 2}},
                {"leaf": {"value": [0, 0, 1, 0, 0]}},
                {"leaf": {"value": [0, 0, 0, 3, 1]}}
            ]}]
        })
    }

    fn write(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_with_scaler() {
        let dir = tempfile::tempdir().unwrap();
        let model = write(dir.path(), "model.json", &forest_json());
        let ones = vec![1.0; 5];
        let scaler = write(dir.path(), "scaler.json", &json!({"mean": ones, "scale": ones}));

        let loaded = load_artifacts(&model, &scaler).unwrap();
        assert!(loaded.scaler.is_some());
        assert_eq!(loaded.metadata.n_estimators, 1);
        assert_eq!(loaded.metadata.checksum.len(), 64);

        // 0.5 - 1.0 <= 0.0 after scaling -> Hurricane
        let p = loaded.predict(&[0.5; 5]).unwrap();
        assert_eq!(p.disaster_type, DisasterType::Hurricane);
        assert_eq!(p.confidence, 1.0);
        assert_eq!(p.severity, 5);
    }

    #[test]
    fn test_missing_scaler_is_degraded_mode() {
        let dir = tempfile::tempdir().unwrap();
        let model = write(dir.path(), "model.json", &forest_json());

        let loaded = load_artifacts(&model, &dir.path().join("absent.json")).unwrap();
        assert!(loaded.scaler.is_none());
        assert!(loaded.metadata.scaler_path.is_none());

        let p = loaded.predict(&[0.5; 5]).unwrap();
        assert_eq!(p.disaster_type, DisasterType::Tornado);
        assert!((p.confidence - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_scaler_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let model = write(dir.path(), "model.json", &forest_json());
        let (zeros, ones) = (vec![0.0; 3], vec![1.0; 3]);
        let scaler = write(dir.path(), "scaler.json", &json!({"mean": zeros, "scale": ones}));

        let loaded = load_artifacts(&model, &scaler).unwrap();
        assert!(loaded.scaler.is_none());
    }

    #[test]
    fn test_corrupt_scaler_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let model = write(dir.path(), "model.json", &forest_json());
        let scaler = dir.path().join("scaler.json");
        fs::write(&scaler, b"not json").unwrap();

        assert!(load_artifacts(&model, &scaler).unwrap().scaler.is_none());
    }

    #[test]
    fn test_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_artifacts(&dir.path().join("model.json"), &dir.path().join("scaler.json"))
            .err()
            .unwrap();
        assert!(err.is_missing());
    }

    #[test]
    fn test_label_order_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = forest_json();
        value["classes"] = json!(["Flood", "Earthquake", "Hurricane", "Tornado", "Wildfire"]);
        let model = write(dir.path(), "model.json", &value);

        let err = load_artifacts(&model, &dir.path().join("scaler.json")).err().unwrap();
        assert!(matches!(err, LoadError::Invalid { .. }));
    }

    #[test]
    fn test_wrong_feature_count_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = forest_json();
        value["n_features"] = json!(4);
        let model = write(dir.path(), "model.json", &value);

        assert!(load_artifacts(&model, &dir.path().join("scaler.json")).is_err());
    }

    #[test]
    fn test_spawn_load_publishes_once() {
        let dir = tempfile::tempdir().unwrap();
        let model = write(dir.path(), "model.json", &forest_json());
        let slot = Arc::new(ModelSlot::new());
        assert_eq!(slot.status(), LoadStatus::Loading);

        tokio_test::block_on(async {
            spawn_load(model.clone(), dir.path().join("scaler.json"), slot.clone())
                .await
                .unwrap();
        });

        assert!(slot.is_ready());
        assert_eq!(slot.status(), LoadStatus::Ready);

        // Second load attempt does not replace the published model
        let again = load_artifacts(&model, &dir.path().join("scaler.json")).unwrap();
        assert!(!slot.publish(again));
        assert!(!slot.record_failure("late".to_string()));
        assert_eq!(slot.status(), LoadStatus::Ready);
    }

    #[test]
    fn test_repeated_load_keeps_first_model() {
        let dir = tempfile::tempdir().unwrap();
        let model = write(dir.path(), "model.json", &forest_json());
        let slot = ModelSlot::new();

        load_model(&model, &dir.path().join("scaler.json"), &slot);
        let first = slot.get().unwrap().metadata.loaded_at;

        // A refused publish or failure is logged, never applied
        let mut changed = forest_json();
        changed["trees"][0]["nodes"][1] = json!({"leaf": {"value": [1, 0, 0, 0, 0]}});
        write(dir.path(), "model.json", &changed);
        load_model(&model, &dir.path().join("scaler.json"), &slot);
        load_model(&dir.path().join("absent.json"), &dir.path().join("scaler.json"), &slot);

        assert_eq!(slot.status(), LoadStatus::Ready);
        assert!(slot.failure().is_none());
        assert_eq!(slot.get().unwrap().metadata.loaded_at, first);
        let p = slot.get().unwrap().predict(&[0.0; 5]).unwrap();
        assert_eq!(p.disaster_type, DisasterType::Hurricane);
    }

    #[test]
    fn test_failed_load_stays_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.json");
        fs::write(&model, b"{\"trees\": 1}").unwrap();
        let slot = ModelSlot::new();

        load_model(&model, &dir.path().join("scaler.json"), &slot);

        assert!(!slot.is_ready());
        assert_eq!(slot.status(), LoadStatus::Failed);
        assert!(slot.failure().unwrap().contains("cannot parse"));
    }
}
