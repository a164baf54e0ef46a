/// The number of values representing bounding box coordinates in YOLO format.
///
/// YOLO format uses 4 values: [center_x, center_y, width, height]
pub const CXYWH_OFFSET: usize = 4;

/// Index of the objectness logit inside one box record.
///
/// Class scores start right after it.
pub const OBJECTNESS_OFFSET: usize = CXYWH_OFFSET;

/// Number of values in a box record that precede the class scores.
pub const RECORD_HEADER_SIZE: usize = CXYWH_OFFSET + 1;

/// The number of classes the default COCO detector was trained on.
pub const NUM_CLASSES: usize = 80;

/// Side of the square model input in pixels.
///
/// Images are letterboxed into a `MODEL_SIZE x MODEL_SIZE` canvas before
/// inference, so every model-space coordinate lies in `0..MODEL_SIZE`.
pub const MODEL_SIZE: u32 = 640;

/// Minimum fused confidence (`objectness * class score`) for a candidate.
pub const PROBA_THRESHOLD: f32 = 0.5;

/// IoU threshold for Non-Maximum Suppression (NMS).
///
/// A candidate whose IoU with a higher scoring box of the same class is
/// at least this value is treated as a duplicate and dropped.
pub const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Default number of detections returned in top-N mode.
pub const DEFAULT_TOP_N: usize = 5;

/// Number of color channels in the input image.
pub const INPUT_CHANNELS: usize = 3;

/// Batch size for model inference.
pub const BATCH_SIZE: usize = 1;

/// Neutral gray used for the letterbox border.
pub const PAD_COLOR: [u8; 3] = [128, 128, 128];

/// Default input tensor name of exported YOLO graphs.
pub const INPUT_NAME: &str = "images";

/// Default output tensor name of exported YOLO graphs.
pub const OUTPUT_NAME: &str = "output0";

/// Environment variable pointing at a JSON detector config file.
pub const CONFIG_PATH_ENV_NAME: &str = "SIGHTLINE_CONFIG";

/// Environment variable overriding the ONNX model path of any config.
pub const MODEL_PATH_ENV_NAME: &str = "SIGHTLINE_MODEL_PATH";
