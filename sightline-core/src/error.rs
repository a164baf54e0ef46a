use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DetectError {
    #[snafu(display("Invalid image: {}", source))]
    InvalidImage { source: ImageIssue },
    #[snafu(display(
        "Shape mismatch at stage `{}`: expected {}, got {}",
        stage,
        expected,
        actual
    ))]
    ShapeMismatch {
        stage: String,
        expected: String,
        actual: String,
    },
    #[snafu(display("Unknown class id {} (catalog holds {} classes)", class_id, catalog_size))]
    UnknownClass { class_id: u32, catalog_size: usize },
    #[snafu(display("Inference engine failure: {}", source))]
    EngineFailure { source: EngineIssue },
    #[snafu(display("Ort Session init stage `{}` error: {}", stage, source))]
    OrtInit {
        source: ort::error::Error,
        stage: String,
    },
    #[snafu(display("Detection task join error: {}", source))]
    Join { source: tokio::task::JoinError },
    #[snafu(display("Read config `{}` error: {}", path, source))]
    ConfigRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Parse config `{}` error: {}", path, source))]
    ConfigParse {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Invalid config: {}", reason))]
    ConfigInvalid { reason: String },
    #[snafu(display("Environment `{}` Not Found, error {}", name, source))]
    EnvNotFound {
        source: std::env::VarError,
        name: String,
    },
    #[snafu(display("Image Write error: {}", source))]
    ImageWrite {
        source: image::ImageError,
        path: String,
    },
    #[snafu(display("Read `{}` error: {}", path, source))]
    IoRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Write `{}` error: {}", path, source))]
    IoWrite {
        source: std::io::Error,
        path: String,
    },
}

/// Why an input could not be used as an image.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ImageIssue {
    #[snafu(display("zero-sized image {}x{}", width, height))]
    EmptyImage { width: u32, height: u32 },
    #[snafu(display("undecodable bytes: {}", source))]
    Undecodable { source: image::ImageError },
    #[snafu(display("bad base64 payload: {}", source))]
    BadBase64 { source: base64::DecodeError },
}

/// What went wrong inside one inference call.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum EngineIssue {
    #[snafu(display("Onnx Inference error: {}", source))]
    Runtime { source: ort::error::Error },
    #[snafu(display("Build Tensor for `{}` error: {}", stage, source))]
    Tensor {
        source: ort::error::Error,
        stage: String,
    },
    #[snafu(display("Onnx Output can not found {}", output_name))]
    MissingOutput { output_name: String },
    #[snafu(display("every engine slot was poisoned by an earlier panic (last tried {})", slot))]
    Panicked { slot: usize },
}
