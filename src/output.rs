//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every report leads with the file it is about, followed by indented
//! context lines. Sizes are shown human-readable; the JSON variants of each
//! command carry the exact byte counts.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! photo.jpg → uploads/photo.jpg
//!     Dimensions: 4000x3000 → 600x450 (resized)
//!     Size: 2.3 MB → 412.0 KB (-82%)
//!     Format: jpg @ q70 (2 attempts)
//!     Budget: 500.0 KB (met)
//! ```
//!
//! When the quality search could not meet the budget and the WebP fallback
//! was written, a `Fallback:` line names the new extension.
//!
//! ## Inspect
//!
//! ```text
//! photo.jpg
//!     Dimensions: 600x450
//!     Format: jpg (photographic)
//!     Size: 412.0 KB
//! ```
//!
//! ## Check
//!
//! ```text
//! photo.jpg: needs processing (width 4000 > 600, size 2.3 MB > 500.0 KB)
//! logo.png: within limits
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::{ImageInfo, ImageKind, ProcessingOptions};
use crate::inspect::exceeds;
use crate::pipeline::ProcessingResult;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count: `812 B`, `412.0 KB`, `2.3 MB`.
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

/// Signed percentage change, rounded: `-82%`, `+5%`, `0%`.
fn percent_change(from: u64, to: u64) -> String {
    if from == 0 {
        return "n/a".to_string();
    }
    let pct = ((to as f64 - from as f64) / from as f64 * 100.0).round() as i64;
    if pct > 0 {
        format!("+{}%", pct)
    } else {
        format!("{}%", pct)
    }
}

fn kind_label(kind: ImageKind) -> &'static str {
    match kind {
        ImageKind::Photographic => "photographic",
        ImageKind::Indexed => "indexed",
        ImageKind::LosslessAlpha => "lossless-alpha",
        ImageKind::Other => "other",
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// process
// ============================================================================

/// Format the report for one processed image.
pub fn format_process_result(
    input: &Path,
    result: &ProcessingResult,
    options: &ProcessingOptions,
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} \u{2192} {}",
        display_name(input),
        result.output_path.display()
    ));

    let dims = if result.was_resized {
        format!(
            "{} \u{2192} {} (resized)",
            result.original_dimensions, result.final_dimensions
        )
    } else {
        format!("{}", result.final_dimensions)
    };
    lines.push(format!("{}Dimensions: {}", indent(1), dims));

    lines.push(format!(
        "{}Size: {} \u{2192} {} ({})",
        indent(1),
        format_bytes(result.original_size_bytes),
        format_bytes(result.final_size_bytes),
        percent_change(result.original_size_bytes, result.final_size_bytes)
    ));

    let attempts = result.attempts.len();
    lines.push(format!(
        "{}Format: {} @ q{} ({} attempt{})",
        indent(1),
        result.output_format.extension(),
        result.final_quality,
        attempts,
        if attempts == 1 { "" } else { "s" }
    ));

    if result.used_fallback {
        lines.push(format!(
            "{}Fallback: {} (extension changed)",
            indent(1),
            result.output_format.extension()
        ));
    }

    let verdict = if result.within_budget(options) {
        "met"
    } else {
        "exceeded"
    };
    lines.push(format!(
        "{}Budget: {} ({})",
        indent(1),
        format_bytes(options.max_size_bytes),
        verdict
    ));
    lines
}

pub fn print_process_result(input: &Path, result: &ProcessingResult, options: &ProcessingOptions) {
    for line in format_process_result(input, result, options) {
        println!("{}", line);
    }
}

/// Format the notice printed when the original bytes were stored instead.
pub fn format_kept_original(dest: &Path, error: &str) -> Vec<String> {
    vec![
        format!("{}: processing failed, stored original", dest.display()),
        format!("{}Error: {}", indent(1), error),
    ]
}

// ============================================================================
// inspect
// ============================================================================

/// Format image metadata, or the unreadable notice when `info` is `None`.
pub fn format_inspect(path: &Path, info: Option<&ImageInfo>) -> Vec<String> {
    let Some(info) = info else {
        return vec![format!("{}: not a readable image", path.display())];
    };
    vec![
        path.display().to_string(),
        format!("{}Dimensions: {}x{}", indent(1), info.width, info.height),
        format!(
            "{}Format: {} ({})",
            indent(1),
            info.format,
            kind_label(info.kind)
        ),
        format!("{}Size: {}", indent(1), format_bytes(info.size_bytes)),
    ]
}

pub fn print_inspect(path: &Path, info: Option<&ImageInfo>) {
    for line in format_inspect(path, info) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Which limits `info` exceeds, in display form.
fn exceeded_limits(info: &ImageInfo, options: &ProcessingOptions) -> Vec<String> {
    let mut reasons = Vec::new();
    if info.width > options.max_width {
        reasons.push(format!("width {} > {}", info.width, options.max_width));
    }
    if info.height > options.max_height {
        reasons.push(format!("height {} > {}", info.height, options.max_height));
    }
    if info.size_bytes > options.max_size_bytes {
        reasons.push(format!(
            "size {} > {}",
            format_bytes(info.size_bytes),
            format_bytes(options.max_size_bytes)
        ));
    }
    reasons
}

/// One-line verdict for `check`.
pub fn format_check(path: &Path, info: Option<&ImageInfo>, options: &ProcessingOptions) -> String {
    let Some(info) = info else {
        return format!("{}: not a readable image", path.display());
    };
    if exceeds(info, options) {
        let reasons = exceeded_limits(info, options);
        format!("{}: needs processing ({})", path.display(), reasons.join(", "))
    } else {
        format!("{}: within limits", path.display())
    }
}

pub fn print_check(path: &Path, info: Option<&ImageInfo>, options: &ProcessingOptions) {
    println!("{}", format_check(path, info, options));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::Attempt;
    use crate::imaging::{Dimensions, OutputFormat, Quality};
    use std::path::PathBuf;

    fn result(fallback: bool) -> ProcessingResult {
        let format = if fallback {
            OutputFormat::WebP
        } else {
            OutputFormat::Jpeg
        };
        ProcessingResult {
            success: true,
            original_size_bytes: 2_400_000,
            final_size_bytes: 421_888,
            original_dimensions: Dimensions {
                width: 4000,
                height: 3000,
            },
            final_dimensions: Dimensions {
                width: 600,
                height: 450,
            },
            was_resized: true,
            was_compressed: true,
            output_path: PathBuf::from(format!("uploads/photo.{}", format.extension())),
            output_format: format,
            final_quality: Quality::new(70),
            used_fallback: fallback,
            attempts: vec![
                Attempt {
                    quality: Quality::new(85),
                    format: OutputFormat::Jpeg,
                    size_bytes: 600_000,
                },
                Attempt {
                    quality: Quality::new(70),
                    format,
                    size_bytes: 421_888,
                },
            ],
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(512_000), "500.0 KB");
        assert_eq!(format_bytes(2_400_000), "2.3 MB");
    }

    #[test]
    fn percent_change_signs() {
        assert_eq!(percent_change(100, 18), "-82%");
        assert_eq!(percent_change(100, 105), "+5%");
        assert_eq!(percent_change(100, 100), "0%");
        assert_eq!(percent_change(0, 100), "n/a");
    }

    #[test]
    fn display_name_uses_file_name() {
        assert_eq!(display_name(Path::new("/a/b/photo.jpg")), "photo.jpg");
    }

    // =========================================================================
    // process
    // =========================================================================

    #[test]
    fn process_result_lines() {
        let lines = format_process_result(
            Path::new("in/photo.jpg"),
            &result(false),
            &ProcessingOptions::default(),
        );
        assert_eq!(
            lines,
            vec![
                "photo.jpg \u{2192} uploads/photo.jpg",
                "    Dimensions: 4000x3000 \u{2192} 600x450 (resized)",
                "    Size: 2.3 MB \u{2192} 412.0 KB (-82%)",
                "    Format: jpg @ q70 (2 attempts)",
                "    Budget: 500.0 KB (met)",
            ]
        );
    }

    #[test]
    fn process_result_shows_fallback() {
        let lines = format_process_result(
            Path::new("photo.jpg"),
            &result(true),
            &ProcessingOptions::default(),
        );
        assert!(lines.contains(&"    Fallback: webp (extension changed)".to_string()));
        assert!(lines[0].ends_with("uploads/photo.webp"));
    }

    #[test]
    fn process_result_over_budget() {
        let options = ProcessingOptions {
            max_size_bytes: 1000,
            ..ProcessingOptions::default()
        };
        let lines = format_process_result(Path::new("photo.jpg"), &result(false), &options);
        assert_eq!(lines.last().unwrap(), "    Budget: 1000 B (exceeded)");
    }

    #[test]
    fn process_result_unresized_single_attempt() {
        let mut r = result(false);
        r.was_resized = false;
        r.final_dimensions = r.original_dimensions;
        r.attempts.truncate(1);
        let lines = format_process_result(Path::new("photo.jpg"), &r, &ProcessingOptions::default());
        assert_eq!(lines[1], "    Dimensions: 4000x3000");
        assert!(lines[3].ends_with("(1 attempt)"));
    }

    #[test]
    fn kept_original_lines() {
        let lines = format_kept_original(Path::new("up/a.jpg"), "Not a decodable image: bad");
        assert_eq!(lines[0], "up/a.jpg: processing failed, stored original");
        assert_eq!(lines[1], "    Error: Not a decodable image: bad");
    }

    // =========================================================================
    // inspect / check
    // =========================================================================

    fn info(width: u32, height: u32, size_bytes: u64) -> ImageInfo {
        ImageInfo {
            width,
            height,
            kind: ImageKind::Photographic,
            format: "jpg".to_string(),
            size_bytes,
        }
    }

    #[test]
    fn inspect_lines() {
        let lines = format_inspect(Path::new("photo.jpg"), Some(&info(600, 450, 421_888)));
        assert_eq!(
            lines,
            vec![
                "photo.jpg",
                "    Dimensions: 600x450",
                "    Format: jpg (photographic)",
                "    Size: 412.0 KB",
            ]
        );
    }

    #[test]
    fn inspect_unreadable() {
        assert_eq!(
            format_inspect(Path::new("x.bin"), None),
            vec!["x.bin: not a readable image"]
        );
    }

    #[test]
    fn check_within_limits() {
        let line = format_check(
            Path::new("a.jpg"),
            Some(&info(600, 600, 512_000)),
            &ProcessingOptions::default(),
        );
        assert_eq!(line, "a.jpg: within limits");
    }

    #[test]
    fn check_lists_every_exceeded_limit() {
        let line = format_check(
            Path::new("a.jpg"),
            Some(&info(4000, 3000, 2_400_000)),
            &ProcessingOptions::default(),
        );
        assert_eq!(
            line,
            "a.jpg: needs processing (width 4000 > 600, height 3000 > 600, size 2.3 MB > 500.0 KB)"
        );
    }

    #[test]
    fn check_unreadable() {
        let line = format_check(Path::new("a.jpg"), None, &ProcessingOptions::default());
        assert_eq!(line, "a.jpg: not a readable image");
    }
}
