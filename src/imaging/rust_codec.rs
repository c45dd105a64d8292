//! Default codec: the `image` crate plus libwebp for WebP output.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF, BMP, TIFF) | `image::ImageReader` with content sniffing |
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3`, sized by [`fit_within`] |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | Encode → PNG | [`palette`](super::palette): `png` + `color_quant` |
//! | Encode → WebP | `webp::Encoder::encode_advanced` (lossy, libwebp) at the requested quality |

use super::calculations::fit_within;
use super::codec::{
    CodecError, Dimensions, ImageCodec, ImageInfo, ImageKind, OutputFormat, SourceImage,
    format_name,
};
use super::palette;
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Codec over the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_jpeg(pixels: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CodecError> {
    // JPEG carries no alpha channel
    let rgb = DynamicImage::ImageRgb8(pixels.to_rgb8());
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.as_u8());
    rgb.write_with_encoder(encoder)
        .map_err(|e| CodecError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

/// Encode as lossy WebP at `quality`. Alpha, when present, is kept and
/// compressed losslessly by libwebp.
fn encode_webp(pixels: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CodecError> {
    let (width, height) = pixels.dimensions();
    let raw;
    let encoder = if pixels.color().has_alpha() {
        raw = pixels.to_rgba8().into_raw();
        webp::Encoder::from_rgba(&raw, width, height)
    } else {
        raw = pixels.to_rgb8().into_raw();
        webp::Encoder::from_rgb(&raw, width, height)
    };

    let mut config = webp::WebPConfig::new()
        .map_err(|_| CodecError::Encode("failed to create WebPConfig".to_string()))?;
    config.quality = quality.value() as f32;

    let encoded = encoder
        .encode_advanced(&config)
        .map_err(|e| CodecError::Encode(format!("WebP encode failed: {e:?}")))?;
    Ok(encoded.to_vec())
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, CodecError> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = reader
            .format()
            .ok_or_else(|| CodecError::Decode("Unrecognized image format".to_string()))?;
        let pixels = reader
            .decode()
            .map_err(|e| CodecError::Decode(format!("Failed to decode {format:?}: {e}")))?;

        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(CodecError::Decode(format!(
                "Image has no pixels ({width}x{height})"
            )));
        }

        Ok(SourceImage {
            pixels,
            dimensions: Dimensions { width, height },
            kind: ImageKind::from_format(format),
            byte_len: bytes.len() as u64,
        })
    }

    fn identify(&self, path: &Path) -> Result<ImageInfo, CodecError> {
        let size_bytes = std::fs::metadata(path)?.len();
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            CodecError::Decode(format!("Unrecognized image format: {}", path.display()))
        })?;
        let (width, height) = reader.into_dimensions().map_err(|e| {
            CodecError::Decode(format!("Failed to read dimensions: {e}"))
        })?;
        if width == 0 || height == 0 {
            return Err(CodecError::Decode(format!(
                "Image has no pixels ({width}x{height})"
            )));
        }

        Ok(ImageInfo {
            width,
            height,
            kind: ImageKind::from_format(format),
            format: format_name(format),
            size_bytes,
        })
    }

    fn encode(
        &self,
        pixels: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        match format {
            OutputFormat::Jpeg => encode_jpeg(pixels, quality),
            OutputFormat::Png => palette::encode_png(pixels),
            OutputFormat::WebP => encode_webp(pixels, quality),
        }
    }

    fn resize(&self, pixels: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (src_w, src_h) = pixels.dimensions();
        let plan = fit_within(src_w, src_h, width, height);
        if !plan.needs_resize {
            return pixels.clone();
        }
        pixels.resize_exact(plan.width, plan.height, FilterType::Lanczos3)
    }
}
