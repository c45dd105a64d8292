//! The normalization pipeline: one upload in, one file and a report out.
//!
//! ```text
//! bytes ─► decode ─► fit_within ─► (resize) ─► compress ─► write_atomic ─► ProcessingResult
//! ```
//!
//! Failures are clean: a decode error returns before anything touches the
//! filesystem, and a write error leaves no partial file at the destination.
//! The pipeline never falls back to storing the original bytes itself; that
//! is the caller's call (the CLI's `--keep-original-on-error` is one such
//! caller).
//!
//! A run can be cancelled from another thread through an [`AtomicBool`]. The
//! flag is checked after decoding and again right before the write, so a
//! cancelled run never publishes a file.

use crate::compress::{Attempt, compress};
use crate::imaging::{
    CodecError, Dimensions, ImageCodec, OutputFormat, ProcessingOptions, Quality, RustCodec,
    SourceImage, fit_within,
};
use crate::persist::{output_path_for, write_atomic};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Not a decodable image: {0}")]
    Decode(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cancelled before anything was written")]
    Cancelled,
}

impl ProcessError {
    fn decode(err: CodecError) -> Self {
        match err {
            CodecError::Decode(msg) => Self::Decode(msg),
            other => Self::Decode(other.to_string()),
        }
    }

    fn encode(err: CodecError) -> Self {
        match err {
            CodecError::Encode(msg) => Self::Encode(msg),
            other => Self::Encode(other.to_string()),
        }
    }
}

/// What the pipeline did. The only value returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub original_size_bytes: u64,
    pub final_size_bytes: u64,
    pub original_dimensions: Dimensions,
    pub final_dimensions: Dimensions,
    pub was_resized: bool,
    /// True iff the written file is smaller than the input bytes.
    pub was_compressed: bool,
    /// Where the file actually landed. Authoritative: differs from the
    /// requested path when the written format changed the extension.
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
    pub final_quality: Quality,
    pub used_fallback: bool,
    pub attempts: Vec<Attempt>,
}

impl ProcessingResult {
    /// Whether the result landed somewhere other than the requested path.
    pub fn path_changed(&self, requested: &Path) -> bool {
        self.output_path != requested
    }

    pub fn within_budget(&self, options: &ProcessingOptions) -> bool {
        self.final_size_bytes <= options.max_size_bytes
    }
}

/// The pipeline bound to a codec.
pub struct Pipeline<C: ImageCodec = RustCodec> {
    codec: C,
}

impl Pipeline<RustCodec> {
    pub fn new() -> Self {
        Self::with_codec(RustCodec::new())
    }
}

impl Default for Pipeline<RustCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ImageCodec> Pipeline<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Decode `bytes`, normalize, and write the result at (or next to) `dest`.
    pub fn process(
        &self,
        bytes: &[u8],
        dest: &Path,
        options: &ProcessingOptions,
    ) -> Result<ProcessingResult, ProcessError> {
        self.process_cancellable(bytes, dest, options, &AtomicBool::new(false))
    }

    /// [`process`](Self::process) that gives up with
    /// [`ProcessError::Cancelled`] once `cancel` is set, unless the file has
    /// already been written.
    pub fn process_cancellable(
        &self,
        bytes: &[u8],
        dest: &Path,
        options: &ProcessingOptions,
        cancel: &AtomicBool,
    ) -> Result<ProcessingResult, ProcessError> {
        let source = self.codec.decode(bytes).map_err(ProcessError::decode)?;
        check_cancel(cancel)?;
        self.run(&source, dest, options, cancel)
    }

    /// Same as [`process`](Self::process) for an already-decoded source.
    pub fn process_source(
        &self,
        source: &SourceImage,
        dest: &Path,
        options: &ProcessingOptions,
    ) -> Result<ProcessingResult, ProcessError> {
        self.run(source, dest, options, &AtomicBool::new(false))
    }

    fn run(
        &self,
        source: &SourceImage,
        dest: &Path,
        options: &ProcessingOptions,
        cancel: &AtomicBool,
    ) -> Result<ProcessingResult, ProcessError> {
        let original = source.dimensions;
        let plan = fit_within(
            original.width,
            original.height,
            options.max_width,
            options.max_height,
        );

        let resized;
        let (pixels, final_dimensions) = if plan.needs_resize {
            resized = self
                .codec
                .resize(&source.pixels, options.max_width, options.max_height);
            let dims = Dimensions {
                width: resized.width(),
                height: resized.height(),
            };
            tracing::debug!(from = %original, to = %dims, "resized");
            (&resized, dims)
        } else {
            (&source.pixels, original)
        };

        let native = source.kind.native_output();
        let compression =
            compress(&self.codec, pixels, native, options).map_err(ProcessError::encode)?;
        let candidate = &compression.candidate;

        check_cancel(cancel)?;
        let output_path = output_path_for(dest, candidate.format, source.kind);
        write_atomic(&output_path, &candidate.bytes).map_err(|source| {
            tracing::warn!(path = %output_path.display(), error = %source, "write failed");
            ProcessError::Io {
                path: output_path.clone(),
                source,
            }
        })?;

        let final_size_bytes = candidate.size_bytes();
        tracing::info!(
            path = %output_path.display(),
            original = source.byte_len,
            written = final_size_bytes,
            format = ?candidate.format,
            quality = %candidate.quality,
            attempts = compression.attempts.len(),
            "image normalized"
        );

        Ok(ProcessingResult {
            success: true,
            original_size_bytes: source.byte_len,
            final_size_bytes,
            original_dimensions: original,
            final_dimensions,
            was_resized: plan.needs_resize,
            was_compressed: final_size_bytes < source.byte_len,
            output_path,
            output_format: candidate.format,
            final_quality: candidate.quality,
            used_fallback: compression.used_fallback,
            attempts: compression.attempts,
        })
    }
}

fn check_cancel(cancel: &AtomicBool) -> Result<(), ProcessError> {
    if cancel.load(Ordering::SeqCst) {
        tracing::debug!("run cancelled before write");
        return Err(ProcessError::Cancelled);
    }
    Ok(())
}

/// Run the pipeline with the default codec.
pub fn process_image(
    bytes: &[u8],
    dest: &Path,
    options: &ProcessingOptions,
) -> Result<ProcessingResult, ProcessError> {
    Pipeline::new().process(bytes, dest, options)
}
