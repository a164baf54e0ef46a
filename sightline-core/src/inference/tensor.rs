use image::RgbImage;
use ndarray::Array4;
use snafu::ensure;

use crate::{
    consts::{BATCH_SIZE, INPUT_CHANNELS},
    error::{DetectError, ShapeMismatchSnafu},
    inference::model::InputTensor,
};

/// Converts an interleaved RGB `size × size` buffer into the planar,
/// `[0, 1]`-normalized `[1, 3, size, size]` tensor the engine expects.
pub fn build_tensor(pixels: &[u8], size: usize) -> Result<InputTensor, DetectError> {
    let plane = size * size;
    ensure!(
        pixels.len() == plane * INPUT_CHANNELS,
        ShapeMismatchSnafu {
            stage: "input-tensor",
            expected: format!("{size}x{size}x{INPUT_CHANNELS} bytes"),
            actual: pixels.len().to_string(),
        }
    );

    let mut data = vec![0.0f32; BATCH_SIZE * INPUT_CHANNELS * plane];
    let (red, rest) = data.split_at_mut(plane);
    let (green, blue) = rest.split_at_mut(plane);

    for (idx, rgb) in pixels.chunks_exact(INPUT_CHANNELS).enumerate() {
        red[idx] = rgb[0] as f32 / 255.0;
        green[idx] = rgb[1] as f32 / 255.0;
        blue[idx] = rgb[2] as f32 / 255.0;
    }

    Array4::from_shape_vec((BATCH_SIZE, INPUT_CHANNELS, size, size), data).map_err(|e| {
        DetectError::ShapeMismatch {
            stage: "input-tensor".to_string(),
            expected: format!("[{BATCH_SIZE}, {INPUT_CHANNELS}, {size}, {size}]"),
            actual: e.to_string(),
        }
    })
}

/// Same as [`build_tensor`] for an already letterboxed square image.
pub fn from_rgb_image(image: &RgbImage) -> Result<InputTensor, DetectError> {
    ensure!(
        image.width() == image.height(),
        ShapeMismatchSnafu {
            stage: "input-image",
            expected: "square image",
            actual: format!("{}x{}", image.width(), image.height()),
        }
    );
    build_tensor(image.as_raw(), image.width() as usize)
}
