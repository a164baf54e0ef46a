use std::path::PathBuf;

use crate::{
    consts::{INPUT_NAME, MODEL_SIZE, NUM_CLASSES, OUTPUT_NAME, RECORD_HEADER_SIZE},
    inference::{decode::ScoreActivation, model::Model},
};

/// Single-stage YOLO detector exported to ONNX with a
/// `[cx, cy, w, h, obj, class...]` record layout.
pub struct Yolo {
    config: YoloConfig,
}

#[derive(Debug, Clone)]
pub struct YoloConfig {
    pub model_path: PathBuf,
    pub input_size: usize,
    pub num_classes: usize,
    pub activation: ScoreActivation,
}

impl YoloConfig {
    /// Values per box record.
    pub fn stride(&self) -> usize {
        RECORD_HEADER_SIZE + self.num_classes
    }
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/yolo.onnx"),
            input_size: MODEL_SIZE as usize,
            num_classes: NUM_CLASSES,
            activation: ScoreActivation::Sigmoid,
        }
    }
}

impl Yolo {
    pub fn new(config: YoloConfig) -> Self {
        Self { config }
    }
}

impl Model for Yolo {
    type Config = YoloConfig;

    const INPUT_NAME: &'static str = INPUT_NAME;

    const OUTPUT_NAME: &'static str = OUTPUT_NAME;

    const MODEL_NAME: &'static str = "yolo-coco";

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
