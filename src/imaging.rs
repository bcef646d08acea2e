//! Passport-format photo preprocessing: center crop to 3:4 and re-encode as
//! JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::data_uri::{self, DataUri, DataUriError};

/// Width:height ratio of a passport photo.
pub const PASSPORT_RATIO: (u32, u32) = (3, 4);
pub const PASSPORT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, thiserror::Error)]
pub enum ImagingError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error(transparent)]
    DataUri(#[from] DataUriError),

    #[error("image has no pixels")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Centered 3:4 region of a `width` x `height` image.
///
/// Wider sources lose columns on both sides, taller ones lose rows top and
/// bottom. A source already within one pixel of 3:4 keeps its full frame so
/// cropping twice is a no-op.
pub fn passport_crop_rect(width: u32, height: u32) -> CropRect {
    let (rw, rh) = PASSPORT_RATIO;
    let (w, h) = (u64::from(width), u64::from(height));

    let (target_w, target_h) = if w * u64::from(rh) > h * u64::from(rw) {
        ((h * u64::from(rw) / u64::from(rh)).max(1), h)
    } else {
        (w, (w * u64::from(rh) / u64::from(rw)).max(1))
    };

    if w - target_w <= 1 && h - target_h <= 1 {
        return CropRect { x: 0, y: 0, width, height };
    }

    CropRect {
        x: ((w - target_w) / 2) as u32,
        y: ((h - target_h) / 2) as u32,
        width: target_w as u32,
        height: target_h as u32,
    }
}

pub fn crop_image(img: &DynamicImage) -> DynamicImage {
    let rect = passport_crop_rect(img.width(), img.height());
    img.crop_imm(rect.x, rect.y, rect.width, rect.height)
}

/// Decode `bytes`, crop to 3:4 and return JPEG bytes.
pub fn crop_to_passport(bytes: &[u8]) -> Result<Vec<u8>, ImagingError> {
    let img = image::load_from_memory(bytes).map_err(ImagingError::Decode)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(ImagingError::Empty);
    }

    let cropped = DynamicImage::ImageRgb8(crop_image(&img).to_rgb8());
    let mut out = Vec::new();
    cropped
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, PASSPORT_JPEG_QUALITY))
        .map_err(ImagingError::Encode)?;

    tracing::debug!(
        src_width = img.width(),
        src_height = img.height(),
        width = cropped.width(),
        height = cropped.height(),
        "cropped photo to passport format"
    );
    Ok(out)
}

/// Same as [`crop_to_passport`] for a photo carried as a data URI.
pub fn crop_data_uri(uri: &str) -> Result<String, ImagingError> {
    let bytes = DataUri::parse(uri)?.decode()?;
    let jpeg = crop_to_passport(&bytes)?;
    Ok(data_uri::encode("image/jpeg", &jpeg))
}
