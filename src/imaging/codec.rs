//! Codec trait and the shared image types.
//!
//! The [`ImageCodec`] trait defines the four operations the pipeline needs:
//! decode, identify, encode, and resize. It is the only seam where format
//! specifics live; everything above it talks in [`ImageKind`] and
//! [`OutputFormat`].
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec), built on `image` and libwebp.

use super::params::Quality;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How the pipeline classifies a decoded source.
///
/// The classification decides which encoder re-encodes the image and whether
/// the WebP fallback is still available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// Block-based lossy photo format (JPEG).
    Photographic,
    /// Palette-capable lossless format (PNG).
    Indexed,
    /// The efficient alpha-capable format (WebP). Also the fallback target.
    LosslessAlpha,
    /// Decodable, but no dedicated encoder (GIF, BMP, TIFF, ...).
    Other,
}

impl ImageKind {
    pub fn from_format(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => Self::Photographic,
            ImageFormat::Png => Self::Indexed,
            ImageFormat::WebP => Self::LosslessAlpha,
            _ => Self::Other,
        }
    }

    /// The output format that is this kind's own container, if any.
    ///
    /// `Other` sources have none: whatever they are written as, the file
    /// changes type.
    pub fn own_format(self) -> Option<OutputFormat> {
        match self {
            Self::Photographic => Some(OutputFormat::Jpeg),
            Self::Indexed => Some(OutputFormat::Png),
            Self::LosslessAlpha => Some(OutputFormat::WebP),
            Self::Other => None,
        }
    }

    /// The encoder used when re-encoding a source of this kind.
    pub fn native_output(self) -> OutputFormat {
        match self {
            Self::Photographic => OutputFormat::Jpeg,
            Self::Indexed => OutputFormat::Png,
            Self::LosslessAlpha => OutputFormat::WebP,
            Self::Other => OutputFormat::Jpeg,
        }
    }
}

/// The closed set of formats the pipeline writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Format used when the quality search alone cannot meet the budget.
    pub const FALLBACK: Self = Self::WebP;

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Whether the encoder output depends on the quality factor.
    ///
    /// PNG output is lossless plus palette quantization, so every quality
    /// produces the same bytes.
    pub fn honours_quality(self) -> bool {
        match self {
            Self::Jpeg | Self::WebP => true,
            Self::Png => false,
        }
    }
}

/// A decoded upload. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub pixels: DynamicImage,
    pub dimensions: Dimensions,
    pub kind: ImageKind,
    /// Size of the encoded input in bytes.
    pub byte_len: u64,
}

/// Header-level facts about an image, as returned by
/// [`ImageCodec::identify`] and [`inspect`](crate::inspect::inspect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub kind: ImageKind,
    /// Detected container format, e.g. `"jpg"`, `"png"`, `"gif"`.
    pub format: String,
    pub size_bytes: u64,
}

/// Short lowercase name for a detected format.
pub(crate) fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| format!("{format:?}").to_lowercase())
}

/// Trait for image codecs.
///
/// Implementations must be deterministic: the same pixels, format, and
/// quality always produce the same bytes. The compressor relies on this to
/// skip redundant encodes for formats that ignore quality.
pub trait ImageCodec: Sync {
    /// Decode an encoded image held in memory.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, CodecError>;

    /// Read dimensions and format from a stored file without a full decode.
    fn identify(&self, path: &Path) -> Result<ImageInfo, CodecError>;

    /// Encode pixels in the given format.
    fn encode(
        &self,
        pixels: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError>;

    /// Fit-inside resize into `width`x`height`. Never upscales.
    fn resize(&self, pixels: &DynamicImage, width: u32, height: u32) -> DynamicImage;
}
