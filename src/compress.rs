//! Budget-driven compression search.
//!
//! Given working pixels and a byte budget, find an encoding that fits:
//!
//! ```text
//! candidate #0   native format @ initial quality
//!      │
//!      ▼  over budget && quality > 20 && re-encodes < 5
//! candidate #n   native format @ previous quality − 15
//!      │
//!      ▼  still over budget && native format isn't WebP
//! fallback       WebP @ max(quality, 60), kept only if not larger
//! ```
//!
//! The search always terminates after at most five re-encodes plus one
//! fallback encode. Running out of attempts is not an error: the best
//! candidate is returned even if it is still over budget.
//!
//! Each step produces a fresh [`CandidateEncoding`]; the superseded one is
//! dropped and only a byte-free [`Attempt`] record of it is kept, so tests
//! and callers can see exactly what the search tried.

use crate::imaging::{CodecError, ImageCodec, OutputFormat, ProcessingOptions, Quality};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Quality decrement per re-encode.
pub const QUALITY_STEP: u32 = 15;
/// No further re-encode once quality is at or below this.
pub const QUALITY_FLOOR: u32 = 20;
/// Maximum re-encodes after the initial encode.
pub const MAX_REENCODES: usize = 5;
/// The fallback encode never starts below this quality.
pub const FALLBACK_MIN_QUALITY: u32 = 60;

/// One encoding produced by the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEncoding {
    pub bytes: Vec<u8>,
    pub quality: Quality,
    pub format: OutputFormat,
}

impl CandidateEncoding {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn fits(&self, budget: u64) -> bool {
        self.size_bytes() <= budget
    }

    fn attempt(&self) -> Attempt {
        Attempt {
            quality: self.quality,
            format: self.format,
            size_bytes: self.size_bytes(),
        }
    }

    /// Same bytes, new quality label. Valid only for formats whose output
    /// does not depend on quality.
    fn relabelled(self, quality: Quality) -> Self {
        Self { quality, ..self }
    }
}

/// Record of one candidate the search produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub quality: Quality,
    pub format: OutputFormat,
    pub size_bytes: u64,
}

/// Outcome of [`compress`].
#[derive(Debug, Clone)]
pub struct Compression {
    /// The candidate to persist.
    pub candidate: CandidateEncoding,
    /// Every candidate in order: the initial encode, each re-encode, and the
    /// fallback if it ran (even when it was discarded).
    pub attempts: Vec<Attempt>,
    /// The candidate is the fallback encoding.
    pub used_fallback: bool,
    reencodes: usize,
}

impl Compression {
    /// Re-encodes in the native format after the initial encode.
    pub fn reencodes(&self) -> usize {
        self.reencodes
    }
}

/// Run the quality search and, if needed, the format fallback.
pub fn compress(
    codec: &impl ImageCodec,
    pixels: &DynamicImage,
    native: OutputFormat,
    options: &ProcessingOptions,
) -> Result<Compression, CodecError> {
    let budget = options.max_size_bytes;
    let encode = |format: OutputFormat, quality: Quality| -> Result<CandidateEncoding, CodecError> {
        let bytes = codec.encode(pixels, format, quality)?;
        tracing::debug!(?format, %quality, size = bytes.len(), budget, "encoded candidate");
        Ok(CandidateEncoding {
            bytes,
            quality,
            format,
        })
    };

    // `Quality`'s field is public, so the starting value may be unclamped
    let initial = Quality::new(options.initial_quality.value());
    let mut candidate = encode(native, initial)?;
    let mut attempts = vec![candidate.attempt()];

    let mut reencodes = 0;
    while !candidate.fits(budget)
        && candidate.quality.value() > QUALITY_FLOOR
        && reencodes < MAX_REENCODES
    {
        let quality = candidate.quality.lowered(QUALITY_STEP);
        candidate = if native.honours_quality() {
            encode(native, quality)?
        } else {
            // Deterministic codec: the encoder would return identical bytes
            candidate.relabelled(quality)
        };
        reencodes += 1;
        attempts.push(candidate.attempt());
    }

    let mut used_fallback = false;
    if !candidate.fits(budget) && native != OutputFormat::FALLBACK {
        let quality = candidate.quality.at_least(FALLBACK_MIN_QUALITY);
        tracing::warn!(
            from = ?native,
            size = candidate.size_bytes(),
            budget,
            %quality,
            "quality search exhausted, falling back to WebP"
        );
        let fallback = encode(OutputFormat::FALLBACK, quality)?;
        attempts.push(fallback.attempt());
        if fallback.size_bytes() <= candidate.size_bytes() {
            candidate = fallback;
            used_fallback = true;
        } else {
            tracing::warn!(
                native_size = candidate.size_bytes(),
                fallback_size = fallback.size_bytes(),
                "WebP fallback is larger, keeping {native:?}"
            );
        }
    }

    Ok(Compression {
        candidate,
        attempts,
        used_fallback,
        reencodes,
    })
}
