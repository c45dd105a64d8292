//! Read-only checks on stored images.
//!
//! These answer "is this file already within policy?" so callers can skip a
//! redundant re-encode. They are hints, not gates: an unreadable file is
//! reported as `None` / `false` rather than as an error, and nothing here
//! ever writes.

use crate::imaging::{ImageCodec, ImageInfo, ProcessingOptions, RustCodec};
use std::path::Path;

/// Dimensions, format, and size of a stored image, or `None` if it cannot
/// be read as one.
pub fn inspect(path: &Path) -> Option<ImageInfo> {
    inspect_with_codec(&RustCodec::new(), path)
}

/// Whether the stored image at `path` exceeds the box or the byte budget.
///
/// Returns `false` when the file is missing or unreadable.
pub fn needs_processing(path: &Path, options: &ProcessingOptions) -> bool {
    needs_processing_with_codec(&RustCodec::new(), path, options)
}

/// [`inspect`] using a specific codec (allows testing with mock).
pub fn inspect_with_codec(codec: &impl ImageCodec, path: &Path) -> Option<ImageInfo> {
    match codec.identify(path) {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "inspect: unreadable");
            None
        }
    }
}

/// [`needs_processing`] using a specific codec.
pub fn needs_processing_with_codec(
    codec: &impl ImageCodec,
    path: &Path,
    options: &ProcessingOptions,
) -> bool {
    inspect_with_codec(codec, path).is_some_and(|info| exceeds(&info, options))
}

/// Policy check on already-read metadata.
pub fn exceeds(info: &ImageInfo, options: &ProcessingOptions) -> bool {
    info.width > options.max_width
        || info.height > options.max_height
        || info.size_bytes > options.max_size_bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ImageKind;
    use crate::imaging::codec::tests::{MockCodec, RecordedOp};
    use crate::test_helpers::{encode_fixture, jpeg_fixture, noise_rgb, smooth_rgb};
    use image::ImageFormat;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

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
    fn inspect_reports_metadata() {
        let tmp = TempDir::new().unwrap();
        let bytes = encode_fixture(&smooth_rgb(64, 32), ImageFormat::Png);
        let path = write(&tmp, "a.png", &bytes);

        let info = inspect(&path).unwrap();
        assert_eq!((info.width, info.height), (64, 32));
        assert_eq!(info.kind, ImageKind::Indexed);
        assert_eq!(info.format, "png");
        assert_eq!(info.size_bytes, bytes.len() as u64);
    }

    #[test]
    fn inspect_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "a.jpg", &jpeg_fixture(&smooth_rgb(50, 40), 90));
        let before = std::fs::read(&path).unwrap();

        assert_eq!(inspect(&path), inspect(&path));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn inspect_garbage_is_none() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "a.jpg", b"not an image at all");
        assert_eq!(inspect(&path), None);
    }

    #[test]
    fn inspect_missing_is_none() {
        assert_eq!(inspect(Path::new("/nonexistent/a.jpg")), None);
    }

    #[test]
    fn small_file_needs_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "a.jpg", &encode_fixture(&smooth_rgb(300, 200), ImageFormat::Jpeg));
        assert!(!needs_processing(&path, &ProcessingOptions::default()));
    }

    #[test]
    fn oversized_dimensions_need_processing() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "a.jpg", &encode_fixture(&smooth_rgb(900, 200), ImageFormat::Jpeg));
        assert!(needs_processing(&path, &ProcessingOptions::default()));
    }

    #[test]
    fn oversized_bytes_need_processing() {
        let tmp = TempDir::new().unwrap();
        let bytes = encode_fixture(&noise_rgb(200, 200, 5), ImageFormat::Png);
        let path = write(&tmp, "a.png", &bytes);
        let options = ProcessingOptions {
            max_size_bytes: bytes.len() as u64 - 1,
            ..ProcessingOptions::default()
        };
        assert!(needs_processing(&path, &options));
    }

    #[test]
    fn unreadable_file_does_not_need_processing() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "a.jpg", &[0u8; 4096]);
        assert!(!needs_processing(&path, &ProcessingOptions::default()));
    }

    #[test]
    fn exceeds_checks_each_limit() {
        let opts = ProcessingOptions::default();
        assert!(!exceeds(&info(600, 600, 512_000), &opts));
        assert!(exceeds(&info(601, 600, 10), &opts));
        assert!(exceeds(&info(600, 601, 10), &opts));
        assert!(exceeds(&info(10, 10, 512_001), &opts));
    }

    #[test]
    fn codec_errors_are_swallowed() {
        let codec = MockCodec::undecodable();
        assert!(!needs_processing_with_codec(
            &codec,
            Path::new("/x.jpg"),
            &ProcessingOptions::default()
        ));
        assert_eq!(
            codec.get_operations(),
            vec![RecordedOp::Identify("/x.jpg".to_string())]
        );
    }
}
