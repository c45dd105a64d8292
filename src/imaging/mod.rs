//! Image codec layer.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / identify** | `image::ImageReader` (content-sniffed) |
//! | **Resize** | [`fit_within`] + Lanczos3 |
//! | **JPEG** | `image` JPEG encoder at the requested quality |
//! | **PNG** | best compression + palette quantization (`png`, `color_quant`) |
//! | **WebP** | lossy libwebp encoder (`webp`) at the requested quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: [`Quality`] and [`ProcessingOptions`]
//! - **Codec**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Palette**: PNG candidate selection and quantization

mod calculations;
pub mod codec;
mod palette;
mod params;
pub mod rust_codec;

pub use calculations::{FitPlan, fit_within};
pub use codec::{
    CodecError, Dimensions, ImageCodec, ImageInfo, ImageKind, OutputFormat, SourceImage,
};
pub use params::{ProcessingOptions, Quality};
pub use rust_codec::RustCodec;
