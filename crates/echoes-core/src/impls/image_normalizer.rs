//! WebpNormalizer - `image` crate based ImageNormalizer
//!
//! decode (declared format) -> EXIF orientation -> RGBA8 -> lossless WebP

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::webp::WebPEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};

use crate::domain::SourceImageType;
use crate::ports::{ImageNormalizer, NormalizeError};

#[derive(Debug, Default, Clone, Copy)]
pub struct WebpNormalizer;

impl WebpNormalizer {
    pub fn new() -> Self {
        Self
    }
}

fn image_format(source: SourceImageType) -> ImageFormat {
    match source {
        SourceImageType::Jpeg => ImageFormat::Jpeg,
        SourceImageType::Png => ImageFormat::Png,
        SourceImageType::Gif => ImageFormat::Gif,
    }
}

impl ImageNormalizer for WebpNormalizer {
    fn normalize(&self, bytes: &[u8], source: SourceImageType) -> Result<Bytes, NormalizeError> {
        let reader = ImageReader::with_format(Cursor::new(bytes), image_format(source));
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| NormalizeError::Decode(e.to_string()))?;
        // Missing or unreadable EXIF means "as stored".
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut decoded =
            DynamicImage::from_decoder(decoder).map_err(|e| NormalizeError::Decode(e.to_string()))?;
        decoded.apply_orientation(orientation);

        let rgba = DynamicImage::ImageRgba8(decoded.to_rgba8());
        let mut out = Vec::new();
        rgba.write_with_encoder(WebPEncoder::new_lossless(&mut out))
            .map_err(|e| NormalizeError::Encode(e.to_string()))?;
        Ok(Bytes::from(out))
    }
}
