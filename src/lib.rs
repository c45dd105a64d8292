//! # pixbudget
//!
//! Normalizes user-uploaded images before they are stored: every image is
//! scaled down to fit a pixel box and re-encoded until it fits a byte budget.
//! Quality degrades gradually; if lowering quality is not enough, the image
//! is re-encoded once in a more efficient format.
//!
//! ```no_run
//! use pixbudget::{ProcessingOptions, process_image};
//! use std::path::Path;
//!
//! let bytes = std::fs::read("upload.jpg")?;
//! let result = process_image(&bytes, Path::new("store/avatar.jpg"), &ProcessingOptions::default())?;
//! // Authoritative: may be store/avatar.webp if the fallback ran
//! println!("{}", result.output_path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture: One Pass per Upload
//!
//! ```text
//! 1. Decode     bytes     →  SourceImage     (pixels + kind + dimensions)
//! 2. Fit        box       →  FitPlan         (integer fit-inside, never up)
//! 3. Compress   budget    →  Compression     (quality steps, then WebP once)
//! 4. Persist    bytes     →  output_path     (atomic rename, extension fixed)
//! ```
//!
//! Each step is a plain function over immutable inputs. Only the last one
//! touches the filesystem, so a failure anywhere earlier leaves nothing
//! behind.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Codec boundary: decode, identify, encode, resize; geometry; options |
//! | [`compress`] | Budget-driven quality search and the WebP fallback |
//! | [`pipeline`] | Orchestration and the [`ProcessingResult`] report |
//! | [`persist`] | Output path rule and atomic writes |
//! | [`inspect`] | Read-only metadata and "already within limits?" checks |
//! | [`pool`] | Bounded rayon worker pool with optional per-image deadline |
//! | [`config`] | `pixbudget.toml` loading, validation, and merging over stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Closed Format Set
//!
//! Sources are classified into four kinds and written in one of three
//! formats. JPEG stays JPEG, PNG stays PNG, WebP stays WebP, and anything
//! else decodable (GIF, BMP, TIFF) becomes JPEG. Dispatch is an exhaustive
//! `match`, so adding a format is a compile error everywhere it matters.
//!
//! ## Best-Effort Budget
//!
//! The byte budget is a target. The search stops after five re-encodes or at
//! quality 20, then tries WebP once at quality 60 or more. The WebP encoding
//! is kept only if it is no larger than the last native one. The result is
//! written even if still over budget; callers that need a hard limit check
//! [`ProcessingResult::within_budget`].
//!
//! ## Imaging Stack
//!
//! Decoding, Lanczos3 resampling, and the JPEG and PNG encoders are pure
//! Rust (`image`, `png`, `color_quant`). WebP output is lossy VP8 from
//! libwebp through the `webp` crate, so the fallback really is the smaller
//! format rather than a lossless container.

pub mod compress;
pub mod config;
pub mod imaging;
pub mod inspect;
pub mod output;
pub mod persist;
pub mod pipeline;
pub mod pool;

pub use imaging::{Dimensions, ImageInfo, ImageKind, OutputFormat, ProcessingOptions, Quality};
pub use inspect::{inspect, needs_processing};
pub use pipeline::{Pipeline, ProcessError, ProcessingResult, process_image};

#[cfg(test)]
pub(crate) mod test_helpers;
