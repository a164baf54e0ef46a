use ndarray::{ArrayBase, Dim, OwnedRepr};
use ort::{
    execution_providers::CPUExecutionProvider,
    session::{
        Session,
        builder::{GraphOptimizationLevel, SessionBuilder},
    },
};
use snafu::ResultExt;

use crate::error::{DetectError, OrtInitSnafu};

/// `[1, 3, S, S]` planar input, values in `[0, 1]`.
pub type InputTensor = ArrayBase<OwnedRepr<f32>, Dim<[usize; 4]>>;

/// Flat engine output: `num_boxes` records of `4 + 1 + num_classes` values.
pub type RawOutput = Vec<f32>;

pub trait Model {
    type Config;

    const INPUT_NAME: &'static str;
    const OUTPUT_NAME: &'static str;
    const MODEL_NAME: &'static str;

    fn config(&self) -> &Self::Config;
}

/// The opaque forward pass. Implementations need not be `Sync`; the
/// pipeline serialises calls through [`EnginePool`](super::pool::EnginePool).
pub trait InferenceEngine: Send {
    fn run(&mut self, input: &InputTensor) -> Result<RawOutput, DetectError>;
}

impl<F> InferenceEngine for F
where
    F: FnMut(&InputTensor) -> Result<RawOutput, DetectError> + Send,
{
    fn run(&mut self, input: &InputTensor) -> Result<RawOutput, DetectError> {
        self(input)
    }
}

/// common session builder
pub fn session_builder(intra_threads: usize) -> Result<SessionBuilder, DetectError> {
    let session_builder = Session::builder()
        .context(OrtInitSnafu { stage: "builder" })?
        .with_execution_providers(vec![
            #[cfg(all(feature = "coreml", target_os = "macos"))]
            {
                use ort::execution_providers::CoreMLExecutionProvider;
                use ort::execution_providers::coreml::*;
                CoreMLExecutionProvider::default()
                    .with_model_format(CoreMLModelFormat::MLProgram)
                    .build()
            },
            #[cfg(feature = "cuda")]
            {
                use ort::execution_providers::CUDAExecutionProvider;
                CUDAExecutionProvider::default().build()
            },
            CPUExecutionProvider::default().build(),
        ])
        .context(OrtInitSnafu { stage: "provider" })?
        .with_optimization_level(GraphOptimizationLevel::Level1)
        .context(OrtInitSnafu {
            stage: "optimization",
        })?
        .with_intra_threads(intra_threads)
        .context(OrtInitSnafu {
            stage: "intra-threads",
        })?;

    Ok(session_builder)
}
