use std::path::{Path, PathBuf};

use serde::Deserialize;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    consts::*,
    error::{
        ConfigInvalidSnafu, ConfigParseSnafu, ConfigReadSnafu, DetectError, EnvNotFoundSnafu,
    },
    inference::{decode::ScoreActivation, yolo::YoloConfig},
    pipeline::{DetectOptions, DetectOptionsBuilder, OutputMode},
};

/// Process-wide detector settings, read once at startup.
///
/// Every field is optional in the JSON file and falls back to the
/// compiled-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    pub input_size: usize,
    pub num_classes: usize,
    pub activation: ScoreActivation,
    /// Number of independent engine sessions; 1 serialises all inference.
    pub engine_slots: usize,
    pub intra_threads: usize,
    /// Newline separated class names; COCO when absent.
    pub catalog_path: Option<PathBuf>,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub top_n: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let model = YoloConfig::default();
        Self {
            model_path: model.model_path,
            input_size: model.input_size,
            num_classes: model.num_classes,
            activation: model.activation,
            engine_slots: 1,
            intra_threads: 4,
            catalog_path: None,
            confidence_threshold: PROBA_THRESHOLD,
            iou_threshold: NMS_IOU_THRESHOLD,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl DetectorConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).context(ConfigReadSnafu {
            path: path.to_string_lossy(),
        })?;
        let config: Self = serde_json::from_str(&content).context(ConfigParseSnafu {
            path: path.to_string_lossy(),
        })?;
        debug!(path = %path.display(), ?config, "config loaded");

        Ok(config.with_env_overrides())
    }

    /// Loads the file named by `SIGHTLINE_CONFIG`.
    pub fn from_env() -> Result<Self, DetectError> {
        let path = std::env::var(CONFIG_PATH_ENV_NAME).context(EnvNotFoundSnafu {
            name: CONFIG_PATH_ENV_NAME,
        })?;
        Self::from_json_file(path)
    }

    /// Applies `SIGHTLINE_MODEL_PATH` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model_path) = std::env::var(MODEL_PATH_ENV_NAME) {
            self.model_path = PathBuf::from(model_path);
        }
        self
    }

    pub fn yolo_config(&self) -> YoloConfig {
        YoloConfig {
            model_path: self.model_path.clone(),
            input_size: self.input_size,
            num_classes: self.num_classes,
            activation: self.activation,
        }
    }

    /// Default per-call options; thresholds outside `[0, 1]` are rejected.
    pub fn detect_options(&self) -> Result<DetectOptions, DetectError> {
        DetectOptionsBuilder::default()
            .confidence_threshold(self.confidence_threshold)
            .iou_threshold(self.iou_threshold)
            .mode(OutputMode::TopN(self.top_n))
            .build()
            .map_err(|e| {
                ConfigInvalidSnafu {
                    reason: e.to_string(),
                }
                .build()
            })
    }
}
