use glam::Vec2;
use snafu::{ResultExt, ensure};

use crate::{
    analysis::bbox::Bbox,
    error::{DetectError, EmptyImageSnafu, InvalidImageSnafu, ShapeMismatchSnafu},
};

/// Uniform scale plus centering offsets that fit an image into a square
/// model input without distortion.
///
/// Padding uses integer floor division, so when the leftover is odd the
/// extra pixel lands on the right / bottom edge. The same `ratio` and pads
/// drive both [`to_model`](Self::to_model) and [`to_image`](Self::to_image).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxTransform {
    pub ratio: f32,
    pub pad_x: i32,
    pub pad_y: i32,
    pub target_size: i32,
    pub width: u32,
    pub height: u32,
}

impl LetterboxTransform {
    pub fn new(width: u32, height: u32, target_size: u32) -> Result<Self, DetectError> {
        ensure!(
            target_size > 0,
            ShapeMismatchSnafu {
                stage: "letterbox",
                expected: "a positive model input size",
                actual: "0",
            }
        );
        if width == 0 || height == 0 {
            return EmptyImageSnafu { width, height }
                .fail()
                .context(InvalidImageSnafu);
        }

        let target = target_size as f32;
        let ratio = f32::min(target / width as f32, target / height as f32);

        let transform = Self {
            ratio,
            pad_x: 0,
            pad_y: 0,
            target_size: target_size as i32,
            width,
            height,
        };
        let (new_w, new_h) = transform.scaled_size();

        Ok(Self {
            pad_x: (target_size - new_w) as i32 / 2,
            pad_y: (target_size - new_h) as i32 / 2,
            ..transform
        })
    }

    /// Size of the resized image before padding, rounded and kept within
    /// `1..=target_size` on both axes.
    pub fn scaled_size(&self) -> (u32, u32) {
        let target = self.target_size as u32;
        let scale = |side: u32| ((side as f32 * self.ratio).round() as u32).clamp(1, target);
        (scale(self.width), scale(self.height))
    }

    /// Maps an original-image point into model space.
    pub fn to_model(&self, point: Vec2) -> Vec2 {
        point * self.ratio + self.pad()
    }

    /// Maps a model-space point back into original-image pixels.
    pub fn to_image(&self, point: Vec2) -> Vec2 {
        (point - self.pad()) / self.ratio
    }

    pub fn bbox_to_image(&self, bbox: &Bbox) -> Bbox {
        Bbox::new(self.to_image(bbox.min), self.to_image(bbox.max))
    }

    fn pad(&self) -> Vec2 {
        Vec2::new(self.pad_x as f32, self.pad_y as f32)
    }
}
