use ort::{
    session::{Session, builder::SessionBuilder},
    value::TensorRef,
};
use snafu::{OptionExt, ResultExt, ensure};
use tracing::*;

use crate::{
    consts::{BATCH_SIZE, INPUT_CHANNELS},
    error::*,
    inference::{
        model::{InferenceEngine, InputTensor, Model, RawOutput},
        yolo::model::Yolo,
    },
};

/// ONNX Runtime backed inference engine.
pub struct YoloSession<M: Model> {
    session: Session,
    model: M,
    output_name: String,
}

impl YoloSession<Yolo> {
    pub fn new(session: SessionBuilder, model: Yolo) -> Result<Self, DetectError> {
        let model_path = &model.config().model_path;
        let session = session
            .commit_from_file(model_path)
            .context(OrtInitSnafu { stage: "commit" })?;

        // Prefer the conventional output name, fall back to the first output
        let output_name = session
            .outputs
            .iter()
            .find(|output| output.name == Yolo::OUTPUT_NAME)
            .or_else(|| session.outputs.first())
            .map(|output| output.name.clone())
            .unwrap_or_else(|| Yolo::OUTPUT_NAME.to_string());

        info!(
            model = Yolo::MODEL_NAME,
            path = %model_path.display(),
            output = %output_name,
            "onnx session ready"
        );

        Ok(Self {
            session,
            model,
            output_name,
        })
    }
}

impl InferenceEngine for YoloSession<Yolo> {
    fn run(&mut self, input: &InputTensor) -> Result<RawOutput, DetectError> {
        let config = self.model.config();
        let expected = [
            BATCH_SIZE,
            INPUT_CHANNELS,
            config.input_size,
            config.input_size,
        ];
        ensure!(
            input.shape() == &expected[..],
            ShapeMismatchSnafu {
                stage: "engine-input",
                expected: format!("{expected:?}"),
                actual: format!("{:?}", input.shape()),
            }
        );
        let stride = config.stride();

        let input = TensorRef::from_array_view(input)
            .context(TensorSnafu { stage: "input" })
            .context(EngineFailureSnafu)?;
        let output = self
            .session
            .run(ort::inputs![Yolo::INPUT_NAME => input])
            .context(RuntimeSnafu)
            .context(EngineFailureSnafu)?;

        let tensor = output
            .get(self.output_name.as_str())
            .context(MissingOutputSnafu {
                output_name: self.output_name.as_str(),
            })
            .context(EngineFailureSnafu)?
            .try_extract_array::<f32>()
            .context(TensorSnafu { stage: "extract" })
            .context(EngineFailureSnafu)?;

        // Records must be the innermost axis: [.., num_boxes, stride]
        ensure!(
            tensor.shape().last() == Some(&stride),
            ShapeMismatchSnafu {
                stage: "engine-output",
                expected: format!("[.., num_boxes, {stride}]"),
                actual: format!("{:?}", tensor.shape()),
            }
        );
        debug!(shape = ?tensor.shape(), "engine output");

        Ok(tensor.iter().copied().collect())
    }
}
