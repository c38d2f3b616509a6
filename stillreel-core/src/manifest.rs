//! Concat manifest construction.
//!
//! The manifest is the text list ffmpeg's concat demuxer reads:
//! one `file '<path>'` line per segment, in segment order. Paths are single
//! quoted, so a quote inside a path is closed, escaped and reopened.

use crate::error::{CoreError, CoreResult};
use crate::synthesis::Segment;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Escapes `path` for use inside a single-quoted concat entry.
pub fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

/// Renders manifest text for `segments` in the order given.
pub fn render_manifest(segments: &[Segment]) -> String {
    let mut text = String::new();
    for segment in segments {
        let _ = writeln!(text, "file '{}'", escape_concat_path(&segment.file_path));
    }
    text
}

/// A written manifest file.
///
/// The file is removed when the manifest is dropped, whether or not the
/// merge that consumed it succeeded.
#[derive(Debug)]
pub struct ConcatManifest {
    path: PathBuf,
    entries: usize,
}

impl ConcatManifest {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> usize {
        self.entries
    }
}

impl Drop for ConcatManifest {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed concat manifest {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                let err = CoreError::CleanupFailed {
                    path: self.path.clone(),
                    source,
                };
                log::warn!("{}", err);
            }
        }
    }
}

/// Writes the manifest for `segments` to `path`.
///
/// Segments must already be in index order; they are written as given.
pub fn build_manifest(path: &Path, segments: &[Segment]) -> CoreResult<ConcatManifest> {
    let text = render_manifest(segments);
    std::fs::write(path, text).map_err(|source| {
        log::error!("Failed to write concat manifest {}: {}", path.display(), source);
        CoreError::ManifestWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;

    log::debug!(
        "Wrote concat manifest {} with {} entries",
        path.display(),
        segments.len()
    );
    Ok(ConcatManifest {
        path: path.to_path_buf(),
        entries: segments.len(),
    })
}
