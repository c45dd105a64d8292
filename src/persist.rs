//! Atomic output and the output-path rule.
//!
//! Bytes are written to a temporary file in the destination directory,
//! flushed to disk, then renamed over the destination. Readers see either the
//! previous file or the complete new one, never a prefix. Concurrent writers
//! to the same path resolve as last-rename-wins.

use crate::imaging::{ImageKind, OutputFormat};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Path the pipeline writes to.
///
/// The requested path is kept when the written format is the source's own
/// format. Otherwise (WebP fallback, or a GIF/BMP/TIFF source re-encoded as
/// JPEG) the extension is replaced so the name matches the content.
pub fn output_path_for(requested: &Path, written: OutputFormat, source: ImageKind) -> PathBuf {
    if source.own_format() == Some(written) {
        requested.to_path_buf()
    } else {
        requested.with_extension(written.extension())
    }
}

/// Write `bytes` to `path` atomically, creating parent directories.
///
/// On error nothing is left at `path` that was not there before; the
/// temporary file is removed when it is dropped.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".pixbudget-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    // Temp files are created 0600; published images must stay readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
