//! Parameter types for the pipeline.
//!
//! These structs describe *what* to aim for, not *how* to get there. They are
//! the interface between callers (CLI flags, config file, an upload handler)
//! and the [`compress`](crate::compress) search, which owns the how.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`ProcessingOptions`]: bounding box, byte budget, and starting quality.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
///
/// The field is public so config and CLI values reach `validate()` as
/// given; anything that encodes goes through [`Quality::new`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Step down by `step`, never below 1.
    pub fn lowered(self, step: u32) -> Self {
        Self::new(self.0.saturating_sub(step))
    }

    /// The larger of `self` and `floor`.
    pub fn at_least(self, floor: u32) -> Self {
        Self::new(self.0.max(floor))
    }

    /// Encoder APIs take `u8`.
    pub(crate) fn as_u8(self) -> u8 {
        self.0.min(100) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Limits applied to every processed image.
///
/// All fields have defaults; override any subset with struct update syntax:
///
/// ```
/// use pixbudget::ProcessingOptions;
///
/// let opts = ProcessingOptions {
///     max_size_bytes: 200 * 1024,
///     ..ProcessingOptions::default()
/// };
/// assert_eq!(opts.max_width, 600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingOptions {
    /// Bounding box width in pixels.
    pub max_width: u32,
    /// Bounding box height in pixels.
    pub max_height: u32,
    /// Target upper bound for the written file. A target, not a guarantee.
    pub max_size_bytes: u64,
    /// Quality of the first encode; the search only ever steps down from here.
    pub initial_quality: Quality,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            max_width: 600,
            max_height: 600,
            max_size_bytes: 500 * 1024,
            initial_quality: Quality::default(),
        }
    }
}
