use std::sync::Arc;

use derive_builder::Builder;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tracing::*;
use uuid::Uuid;

use crate::{
    analysis::{labels::ClassCatalog, letterbox::LetterboxTransform},
    codec,
    config::DetectorConfig,
    consts::{DEFAULT_TOP_N, NMS_IOU_THRESHOLD, PROBA_THRESHOLD},
    error::{DetectError, JoinSnafu},
    inference::{
        decode::{Decoder, ScoreActivation},
        mapper::{Detection, map_detections},
        model::{InferenceEngine, session_builder},
        nms::suppress,
        pool::EnginePool,
        tensor,
        yolo::{Yolo, YoloConfig, YoloSession},
    },
};

/// Which part of the deduplicated, score-sorted result a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Up to `n` detections, best first.
    TopN(usize),
    /// Only the single best detection.
    BestOnly,
}

impl OutputMode {
    pub fn limit(self) -> usize {
        match self {
            OutputMode::TopN(n) => n,
            OutputMode::BestOnly => 1,
        }
    }
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::TopN(DEFAULT_TOP_N)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct DetectOptions {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub mode: OutputMode,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: PROBA_THRESHOLD,
            iou_threshold: NMS_IOU_THRESHOLD,
            mode: OutputMode::default(),
        }
    }
}

impl DetectOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("iou_threshold", self.iou_threshold),
        ] {
            match value {
                Some(threshold) if !(0.0..=1.0).contains(&threshold) => {
                    return Err(format!("{name} {threshold} is outside [0, 1]"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// The detection pipeline: letterbox, tensor, engine, decode, NMS, mapping.
///
/// Everything except the engine call runs without locks, so one `Detector`
/// can be shared between threads or tasks.
pub struct Detector<E> {
    pool: EnginePool<E>,
    catalog: ClassCatalog,
    input_size: u32,
    num_classes: usize,
    activation: ScoreActivation,
}

impl<E: InferenceEngine> Detector<E> {
    pub fn new(pool: EnginePool<E>, catalog: ClassCatalog, model: &YoloConfig) -> Self {
        if catalog.len() < model.num_classes {
            warn!(
                catalog = catalog.len(),
                classes = model.num_classes,
                "class catalog is smaller than the model's class count"
            );
        }

        Self {
            pool,
            catalog,
            input_size: model.input_size as u32,
            num_classes: model.num_classes,
            activation: model.activation,
        }
    }

    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    /// Decodes image bytes and runs the pipeline.
    pub fn detect(
        &self,
        bytes: &[u8],
        options: &DetectOptions,
    ) -> Result<Vec<Detection>, DetectError> {
        let image = codec::decode_image(bytes)?;
        self.detect_image(&image, options)
    }

    /// Accepts plain base64 or a `data:<mime>;base64,` URL.
    pub fn detect_base64(
        &self,
        payload: &str,
        options: &DetectOptions,
    ) -> Result<Vec<Detection>, DetectError> {
        let bytes = codec::decode_base64(payload)?;
        self.detect(&bytes, options)
    }

    #[instrument(skip_all, fields(request = %Uuid::new_v4(), width, height, mode = ?options.mode))]
    pub fn detect_image(
        &self,
        image: &DynamicImage,
        options: &DetectOptions,
    ) -> Result<Vec<Detection>, DetectError> {
        let (width, height) = image.dimensions();
        Span::current().record("width", width).record("height", height);

        let transform = LetterboxTransform::new(width, height, self.input_size)?;
        let canvas = codec::letterbox_image(image, &transform);
        let input = tensor::from_rgb_image(&canvas)?;

        let start_time = std::time::Instant::now();
        let raw = self.pool.with_engine(|engine| engine.run(&input))?;
        debug!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            values = raw.len(),
            "inference completed"
        );

        let detections = self.postprocess(&raw, &transform, options)?;
        info!(detections = detections.len(), "detection finished");

        Ok(detections)
    }

    /// Decode, suppress and map a raw engine output.
    pub fn postprocess(
        &self,
        raw: &[f32],
        transform: &LetterboxTransform,
        options: &DetectOptions,
    ) -> Result<Vec<Detection>, DetectError> {
        let decoder = Decoder {
            num_classes: self.num_classes,
            confidence_threshold: options.confidence_threshold,
            activation: self.activation,
        };

        let candidates = decoder.decode(raw)?;
        let before_nms = candidates.len();

        let kept = suppress(candidates, options.iou_threshold);
        debug!(
            candidates = before_nms,
            kept = kept.len(),
            iou = options.iou_threshold,
            "non-max suppression"
        );

        map_detections(kept, transform, &self.catalog, options.mode.limit())
    }
}

impl<E: InferenceEngine + 'static> Detector<E> {
    /// Runs [`detect`](Self::detect) on the blocking thread pool.
    ///
    /// Dropping the returned future does not interrupt an inference that
    /// already started; its result is discarded.
    pub async fn detect_async(
        self: Arc<Self>,
        bytes: Vec<u8>,
        options: DetectOptions,
    ) -> Result<Vec<Detection>, DetectError> {
        tokio::task::spawn_blocking(move || self.detect(&bytes, &options))
            .await
            .context(JoinSnafu)?
    }
}

impl Detector<YoloSession<Yolo>> {
    /// Builds `engine_slots` ONNX sessions and the class catalog from config.
    pub fn from_config(config: &DetectorConfig) -> Result<Self, DetectError> {
        let model = config.yolo_config();

        info!(
            slots = config.engine_slots,
            path = %model.model_path.display(),
            "loading detector"
        );
        let engines = (0..config.engine_slots.max(1))
            .map(|_| {
                YoloSession::new(session_builder(config.intra_threads)?, Yolo::new(model.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let catalog = match &config.catalog_path {
            Some(path) => ClassCatalog::from_file(path)?,
            None => ClassCatalog::coco(),
        };

        Ok(Self::new(EnginePool::new(engines), catalog, &model))
    }
}
