//! Configuration module

use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL_PATH: &str = "dataset/model.json";
const DEFAULT_SCALER_PATH: &str = "dataset/scaler.json";
const DEFAULT_HOST: &str = "0.0.0.0";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Classifier artifact
    pub model_path: PathBuf,

    /// Optional scaler artifact
    pub scaler_path: PathBuf,

    /// Bind host: an IP literal or a name such as `localhost`
    pub host: String,

    /// Server port
    pub port: u16,

    /// Emit JSON log lines
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH));

        let scaler_path = env::var("SCALER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCALER_PATH));

        let exe_dir = env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf));

        let (model_path, scaler_path) = resolve_artifact_paths(model_path, scaler_path, exe_dir.as_deref());

        Self {
            model_path,
            scaler_path,

            host: host_or_default(env::var("HOST").ok()),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),

            log_json: env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Address for `TcpListener::bind`; host names are resolved there.
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

fn host_or_default(value: Option<String>) -> String {
    value
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string())
}

/// When the configured model is absent, both artifacts are looked up in
/// `dataset/` next to the running executable instead.
pub fn resolve_artifact_paths(
    model_path: PathBuf,
    scaler_path: PathBuf,
    exe_dir: Option<&Path>,
) -> (PathBuf, PathBuf) {
    if model_path.exists() {
        return (model_path, scaler_path);
    }

    match exe_dir {
        Some(dir) => {
            let dataset = dir.join("dataset");
            (dataset.join("model.json"), dataset.join("scaler.json"))
        }
        None => (model_path, scaler_path),
    }
}
