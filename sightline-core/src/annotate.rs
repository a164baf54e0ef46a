use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use snafu::ResultExt;

use crate::{
    analysis::labels::ClassCatalog,
    error::{DetectError, ImageWriteSnafu},
    inference::mapper::Detection,
};

/// Box outline thickness in pixels.
const THICKNESS: i32 = 3;

/// Draws every detection as a class-colored rectangle on a copy of `image`.
pub fn draw_detections(image: &DynamicImage, detections: &[Detection]) -> RgbImage {
    let mut output_img = image.to_rgb8();

    for detection in detections {
        let bbox = detection.bbox;
        let x = bbox.min.x.round() as i32;
        let y = bbox.min.y.round() as i32;
        let width = bbox.width().round() as u32;
        let height = bbox.height().round() as u32;

        if width == 0 || height == 0 {
            continue;
        }

        let color = Rgb(ClassCatalog::color(detection.class_id));

        // Draw multiple rectangles to create thicker lines
        for offset in 0..THICKNESS {
            let thick_rect = Rect::at(x - offset, y - offset)
                .of_size(width + (offset * 2) as u32, height + (offset * 2) as u32);
            draw_hollow_rect_mut(&mut output_img, thick_rect, color);
        }
    }

    output_img
}

pub fn save_annotated<P: AsRef<Path>>(
    image: &DynamicImage,
    detections: &[Detection],
    output: P,
) -> Result<(), DetectError> {
    let output = output.as_ref();
    draw_detections(image, detections)
        .save(output)
        .context(ImageWriteSnafu {
            path: output.to_string_lossy(),
        })
}
