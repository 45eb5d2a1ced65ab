// Untrusted payload validation and decoding
//
// Turns the request's data URL into a bounded in-memory image or rejects
// it with a classified error. Checks run in a fixed order and the first
// violation wins. Deterministic, no side effects beyond transient
// buffers.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

use crate::core::errors::DetectError;
use crate::utils::image_ops;

/// Maximum width or height accepted, in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 4096;

/// Maximum re-encoded image size accepted, in bytes.
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

const MIB: f64 = 1024.0 * 1024.0;

/// Media types accepted for upload, with their container formats.
const ALLOWED_TYPES: &[(&str, ImageFormat)] = &[
    ("image/jpeg", ImageFormat::Jpeg),
    ("image/png", ImageFormat::Png),
    ("image/gif", ImageFormat::Gif),
    ("image/bmp", ImageFormat::Bmp),
];

/// A validated raster plus its declared container format.
///
/// Owned exclusively by the request that produced it, freed when the
/// request completes.
#[derive(Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

/// Validate and decode a `data:<media-type>;base64,<payload>` string.
pub fn validate_and_decode(data_url: &str) -> Result<DecodedImage, DetectError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or(DetectError::InvalidFormat)?;
    let (media_type, payload) = rest
        .split_once(";base64,")
        .ok_or(DetectError::InvalidFormat)?;

    // Media types are case-insensitive
    let media_type = media_type.trim().to_ascii_lowercase();
    let format = ALLOWED_TYPES
        .iter()
        .find(|(name, _)| *name == media_type)
        .map(|(_, format)| *format)
        .ok_or_else(|| DetectError::UnsupportedType {
            media_type: media_type.clone(),
        })?;

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| DetectError::InvalidData(format!("payload is not valid base64: {e}")))?;

    let image = image::load_from_memory(&bytes)
        .map_err(|e| DetectError::InvalidData(format!("could not decode image: {e}")))?;

    let (width, height) = image.dimensions();
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(DetectError::DimensionTooLarge {
            width,
            height,
            max: MAX_IMAGE_DIMENSION,
        });
    }

    // Size is judged on the canonical re-encoding, with PNG standing in
    // when the original container cannot be written
    let encoded = image_ops::encode_image(&image, format)
        .or_else(|_| image_ops::encode_image(&image, ImageFormat::Png))
        .map_err(|e| DetectError::InvalidData(format!("could not re-encode image: {e}")))?;
    check_encoded_size(encoded.len())?;

    debug!(width, height, ?format, "image validated");
    Ok(DecodedImage { image, format })
}

fn check_encoded_size(len: usize) -> Result<(), DetectError> {
    if len > MAX_IMAGE_SIZE {
        return Err(DetectError::SizeTooLarge {
            actual_mib: len as f64 / MIB,
            max_mib: MAX_IMAGE_SIZE as f64 / MIB,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encode_data_url(media: &str, format: ImageFormat, width: u32, height: u32) -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([255, 255, 255]),
        ));
        let bytes = image_ops::encode_image(&img, format).unwrap();
        format!("data:{media};base64,{}", BASE64.encode(&bytes))
    }

    #[test]
    fn test_accepts_all_allowed_types() {
        let cases = [
            ("image/png", ImageFormat::Png),
            ("image/jpeg", ImageFormat::Jpeg),
            ("image/gif", ImageFormat::Gif),
            ("image/bmp", ImageFormat::Bmp),
        ];

        for (media, format) in cases {
            let decoded = validate_and_decode(&encode_data_url(media, format, 40, 20))
                .unwrap_or_else(|e| panic!("{media} should decode: {e}"));
            assert_eq!(decoded.format, format);
            assert_eq!(decoded.image.width(), 40);
            assert_eq!(decoded.image.height(), 20);
        }
    }

    #[test]
    fn test_media_type_is_case_insensitive() {
        let url = encode_data_url("image/PNG", ImageFormat::Png, 10, 10);
        assert!(validate_and_decode(&url).is_ok());
    }

    #[test]
    fn test_rejects_payload_without_data_prefix() {
        assert!(matches!(
            validate_and_decode("iVBORw0KGgo="),
            Err(DetectError::InvalidFormat)
        ));
    }

    #[test]
    fn test_rejects_payload_without_base64_marker() {
        assert!(matches!(
            validate_and_decode("data:image/png,iVBORw0KGgo="),
            Err(DetectError::InvalidFormat)
        ));
    }

    #[test]
    fn test_rejects_media_type_outside_allow_set() {
        let url = encode_data_url("image/tiff", ImageFormat::Png, 10, 10);
        let err = validate_and_decode(&url).unwrap_err();
        assert!(matches!(err, DetectError::UnsupportedType { .. }));
        // The message enumerates the allowed set
        let message = err.to_string();
        for allowed in ["jpeg", "png", "gif", "bmp"] {
            assert!(message.contains(allowed), "message should list {allowed}");
        }
    }

    #[test]
    fn test_rejects_invalid_base64() {
        assert!(matches!(
            validate_and_decode("data:image/png;base64,!!!not-base64!!!"),
            Err(DetectError::InvalidData(_))
        ));
    }

    #[test]
    fn test_rejects_undecodable_bytes() {
        let url = format!("data:image/png;base64,{}", BASE64.encode(b"not an image"));
        assert!(matches!(
            validate_and_decode(&url),
            Err(DetectError::InvalidData(_))
        ));
    }

    #[test]
    fn test_accepts_dimension_at_limit() {
        let url = encode_data_url("image/png", ImageFormat::Png, MAX_IMAGE_DIMENSION, 1);
        assert!(validate_and_decode(&url).is_ok());
    }

    #[test]
    fn test_rejects_dimension_over_limit() {
        let url = encode_data_url("image/png", ImageFormat::Png, MAX_IMAGE_DIMENSION + 1, 1);
        let err = validate_and_decode(&url).unwrap_err();
        assert!(matches!(err, DetectError::DimensionTooLarge { .. }));
        assert!(err.to_string().contains("4096"));
    }

    #[test]
    fn test_size_check_allows_limit() {
        assert!(check_encoded_size(MAX_IMAGE_SIZE).is_ok());
    }

    #[test]
    fn test_size_check_reports_two_decimal_mib() {
        let err = check_encoded_size(MAX_IMAGE_SIZE + 1).unwrap_err();
        assert!(err.to_string().contains("maximum of 10.00 MiB"));
    }
}
