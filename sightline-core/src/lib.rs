pub mod analysis;
pub mod annotate;
pub mod codec;
pub mod config;
pub mod consts;
pub mod error;
pub mod inference;
pub mod logging;
pub mod pipeline;

// Re-export commonly used types
pub use analysis::{bbox::Bbox, labels::ClassCatalog, letterbox::LetterboxTransform};
pub use config::DetectorConfig;
pub use error::{DetectError, EngineIssue, ImageIssue};
pub use inference::{
    decode::ScoreActivation,
    mapper::Detection,
    model::{InferenceEngine, InputTensor, RawOutput},
    pool::EnginePool,
};
pub use pipeline::{DetectOptions, DetectOptionsBuilder, Detector, OutputMode};
