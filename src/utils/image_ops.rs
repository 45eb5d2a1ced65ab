use image::{DynamicImage, GrayImage, ImageFormat};
use std::io::Cursor;

/// Encode an image into the given container format.
///
/// Used by the validator to measure an image's canonical encoded size.
pub fn encode_image(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

/// Encode a grayscale raster as PNG, the interchange format handed to
/// the recognition engine.
pub fn encode_gray_png(img: &GrayImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
