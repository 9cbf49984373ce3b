//! Pipeline configuration, loaded from JSON. Every section has defaults, so a
//! partial file (or none) is valid.

use crate::dataset::OutputFormat;
use crate::model::ArtifactError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model artifact: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("classifier variant \"model\" needs model_path")]
    ModelPathMissing,

    #[error("scaler \"pretrained\" needs a model artifact with a fitted scaler")]
    PretrainedScalerMissing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Working directory for raw captures and relative output paths
    pub data_dir: PathBuf,
    /// Model artifact (JSON); optional
    pub model_path: Option<PathBuf>,
    /// Seconds between refreshes; 0 runs once
    pub refresh_interval_secs: u64,
    pub fetch: FetchConfig,
    pub features: FeaturesConfig,
    pub classifier: ClassifierConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Close-approach API endpoint
    pub endpoint: String,
    /// `date-min` query value (`now` or `YYYY-MM-DD`)
    pub date_min: String,
    /// `date-max` query value
    pub date_max: String,
    /// Optional `dist-max` (AU or lunar distances, e.g. `0.5` or `10LD`)
    pub dist_max: Option<String>,
    pub limit: Option<u32>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Keep the last raw response as `data_dir/raw_data.json`
    pub save_capture: bool,
    /// Replay this capture instead of calling the API
    pub replay_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerChoice {
    /// Artifact scaler when present, otherwise fit per batch
    #[default]
    Auto,
    FitPerBatch,
    Pretrained,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub scaler: ScalerChoice,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierChoice {
    /// Model when an artifact loads, otherwise the rule
    #[default]
    Auto,
    Rule,
    Model,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub variant: ClassifierChoice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Relative paths resolve against `data_dir`
    pub path: PathBuf,
    pub format: OutputFormat,
    /// Also write `<path>.meta.json`
    pub metadata_sidecar: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .map(|d| d.join("neo-risk"))
                .unwrap_or_else(|| PathBuf::from(".neo-risk")),
            model_path: None,
            refresh_interval_secs: 0,
            fetch: FetchConfig::default(),
            features: FeaturesConfig::default(),
            classifier: ClassifierConfig::default(),
            output: OutputConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ssd-api.jpl.nasa.gov/cad.api".to_string(),
            date_min: "now".to_string(),
            date_max: "2100-01-01".to_string(),
            dist_max: Some("0.5".to_string()),
            limit: None,
            timeout_secs: 30,
            connect_timeout_secs: 5,
            save_capture: true,
            replay_path: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("neos_labeled.csv"),
            format: OutputFormat::Csv,
            metadata_sidecar: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PipelineConfig {
    /// Load from JSON file if present; otherwise return default.
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match Self::try_load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(&self.output.path)
    }

    pub fn capture_path(&self) -> PathBuf {
        self.data_dir.join("raw_data.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let c = PipelineConfig::load(Path::new("nonexistent.json")).unwrap();
        assert_eq!(c.classifier.variant, ClassifierChoice::Auto);
        assert_eq!(c.refresh_interval_secs, 0);
        assert!(c.fetch.endpoint.ends_with("cad.api"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"classifier": {"variant": "modle"}}"#).unwrap();
        assert!(matches!(PipelineConfig::load(&path), Err(ConfigError::Json(_))));

        std::fs::write(&path, r#"{"classifier": {"variant": "model"}}"#).unwrap();
        let c = PipelineConfig::load(&path).unwrap();
        assert_eq!(c.classifier.variant, ClassifierChoice::Model);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: PipelineConfig = serde_json::from_str(
            r#"{"data_dir": "/tmp/neo", "classifier": {"variant": "rule"}, "output": {"format": "ndjson"}}"#,
        )
        .unwrap();
        assert_eq!(c.classifier.variant, ClassifierChoice::Rule);
        assert_eq!(c.output.format, OutputFormat::Ndjson);
        assert!(c.output.metadata_sidecar);
        assert_eq!(c.output_path(), PathBuf::from("/tmp/neo/neos_labeled.csv"));
        assert_eq!(c.features.scaler, ScalerChoice::Auto);
    }

    #[test]
    fn absolute_output_path_wins() {
        let mut c = PipelineConfig::default();
        c.output.path = PathBuf::from("/srv/neos.csv");
        assert_eq!(c.output_path(), PathBuf::from("/srv/neos.csv"));
    }
}
