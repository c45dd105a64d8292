//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `pixbudget.toml`. Stock defaults
//! are overridden by whatever the file sets; command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [limits]
//! max_width = 600           # Bounding box width (px)
//! max_height = 600          # Bounding box height (px)
//! max_size_bytes = 512000   # Byte budget for the written file
//! initial_quality = 85      # Starting quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Worker threads (omit for auto = CPU cores)
//! timeout_secs = 30         # Per-image deadline (omit for none)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [limits]
//! max_size_bytes = 204800
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::ProcessingOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pixbudget.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `pixbudget.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Box, byte budget, and starting quality for every image.
    pub limits: ProcessingOptions,
    /// Worker pool settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if limits.max_width == 0 || limits.max_height == 0 {
            return Err(ConfigError::Validation(
                "limits.max_width and limits.max_height must be non-zero".into(),
            ));
        }
        if limits.max_size_bytes == 0 {
            return Err(ConfigError::Validation(
                "limits.max_size_bytes must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&limits.initial_quality.value()) {
            return Err(ConfigError::Validation(
                "limits.initial_quality must be 1-100".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if self.processing.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "processing.timeout_secs must be at least 1 (omit for no deadline)".into(),
            ));
        }
        Ok(())
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// Per-image deadline in seconds. Absent means wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl ProcessingConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// Merges file values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load `path` if given, else [`DEFAULT_CONFIG_FILE`] if present in `dir`,
/// else the stock defaults.
pub fn load_config_or_default(
    path: Option<&Path>,
    dir: &Path,
) -> Result<PipelineConfig, ConfigError> {
    match path {
        Some(p) => load_config(p),
        None => {
            let implicit = dir.join(DEFAULT_CONFIG_FILE);
            if implicit.exists() {
                load_config(&implicit)
            } else {
                resolve_config(None)
            }
        }
    }
}

/// Returns a fully-commented stock `pixbudget.toml` with all keys explained.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pixbudget configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
# Command-line flags override anything set here.

# ---------------------------------------------------------------------------
# Limits applied to every image
# ---------------------------------------------------------------------------
[limits]
# Bounding box. Larger images are scaled down to fit, keeping aspect ratio.
# Smaller images are never scaled up.
max_width = 600
max_height = 600

# Byte budget for the written file. Quality is lowered in steps of 15
# (at most 5 times, not below 20) until the file fits; if it still does
# not, the image is re-encoded once as WebP and the extension changes.
# This is a target, not a guarantee.
max_size_bytes = 512000

# Quality of the first encode (1-100).
initial_quality = 85

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# Cancel an image after this many seconds. A cancelled image is never
# written. Omit for no deadline.
# timeout_secs = 30
"##
}
