//! Adapter over the `image` crate: decoding, data-URL payloads and the
//! resize + pad half of letterboxing.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage, imageops, imageops::FilterType};
use snafu::ResultExt;

use crate::{
    analysis::letterbox::LetterboxTransform,
    consts::PAD_COLOR,
    error::{BadBase64Snafu, DetectError, EmptyImageSnafu, InvalidImageSnafu, UndecodableSnafu},
};

/// Decodes JPEG/PNG/... bytes, rejecting zero-sized images.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, DetectError> {
    let image = image::load_from_memory(bytes)
        .context(UndecodableSnafu)
        .context(InvalidImageSnafu)?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return EmptyImageSnafu { width, height }
            .fail()
            .context(InvalidImageSnafu);
    }
    Ok(image)
}

/// Decodes a base64 payload, with or without a `data:<mime>;base64,` prefix.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, DetectError> {
    let data = payload
        .split_once(',')
        .map_or(payload, |(_, data)| data)
        .trim();
    STANDARD
        .decode(data)
        .context(BadBase64Snafu)
        .context(InvalidImageSnafu)
}

/// Resizes `image` with the transform's scale and pads it with neutral gray
/// into a `target_size` square.
pub fn letterbox_image(image: &DynamicImage, transform: &LetterboxTransform) -> RgbImage {
    let (new_w, new_h) = transform.scaled_size();
    let size = transform.target_size as u32;

    let rgb = image.to_rgb8();
    let resized = if (new_w, new_h) == rgb.dimensions() {
        rgb
    } else {
        imageops::resize(&rgb, new_w, new_h, FilterType::Triangle)
    };

    let mut canvas = RgbImage::from_pixel(size, size, Rgb(PAD_COLOR));
    imageops::replace(
        &mut canvas,
        &resized,
        transform.pad_x as i64,
        transform.pad_y as i64,
    );
    canvas
}
