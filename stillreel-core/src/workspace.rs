//! Run-scoped workspace directories.
//!
//! Every job gets a fresh directory created with the `tempfile` crate. The
//! directory and everything written into it is removed when the `Workspace`
//! is closed or dropped, whichever path the job leaves by. Names inside a
//! workspace are derived from segment indices only; uniqueness across
//! concurrent jobs comes from the directory itself.
//!
//! The final merge is also written inside the workspace and only published
//! to the caller's output directory once it is complete, so a failed job
//! never touches a file that already sits at the destination.

use crate::error::{CoreError, CoreResult};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, NamedTempFile, TempDir};

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "stillreel_job_";

/// Name of the concat manifest inside a workspace.
pub const MANIFEST_FILE_NAME: &str = "concat.txt";

/// Prefix of the merged output while it is still inside the workspace.
const STAGED_OUTPUT_PREFIX: &str = "merged_";

/// File name used for segment `index`.
pub fn segment_file_name(index: usize) -> String {
    format!("segment_{index:04}.mp4")
}

/// A job's private scratch directory.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    root: PathBuf,
}

impl Workspace {
    /// Creates a workspace under `parent`, or under the system temp
    /// directory when `parent` is `None`.
    pub fn create(parent: Option<&Path>) -> CoreResult<Self> {
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                TempFileBuilder::new()
                    .prefix(WORKSPACE_PREFIX)
                    .tempdir_in(parent)?
            }
            None => TempFileBuilder::new().prefix(WORKSPACE_PREFIX).tempdir()?,
        };

        // ffmpeg resolves relative concat entries against the manifest's
        // directory, so every path handed out must be absolute.
        let root = dir.path().canonicalize()?;
        log::debug!("Allocated workspace {}", root.display());

        Ok(Self { dir, root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.root.join(segment_file_name(index))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    /// Where the merge writes before the result is published. Keeps the
    /// final file name's extension so ffmpeg picks the same muxer.
    pub fn staged_output_path(&self, filename: &str) -> PathBuf {
        self.root.join(format!("{STAGED_OUTPUT_PREFIX}{filename}"))
    }

    /// Removes the workspace and everything in it.
    ///
    /// Failures come back as `CleanupFailed`; callers log them rather than
    /// letting them replace a job's own result.
    pub fn close(self) -> CoreResult<()> {
        let Workspace { dir, root } = self;
        dir.close().map_err(|source| CoreError::CleanupFailed {
            path: root.clone(),
            source,
        })?;
        log::debug!("Removed workspace {}", root.display());
        Ok(())
    }
}

/// Moves a finished file from the workspace to `destination`.
///
/// A rename is tried first. When that fails (typically because the
/// workspace sits on another filesystem) the file is copied into a temporary
/// sibling of `destination` and persisted over it, so `destination` is either
/// left as it was or replaced by the complete file.
pub fn publish_output(staged: &Path, destination: &Path) -> CoreResult<()> {
    match std::fs::rename(staged, destination) {
        Ok(()) => {
            log::debug!("Moved {} to {}", staged.display(), destination.display());
            return Ok(());
        }
        Err(e) => log::debug!(
            "Rename to {} failed ({}), copying instead",
            destination.display(),
            e
        ),
    }

    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut target = NamedTempFile::new_in(parent)?;
    let mut source = File::open(staged)?;
    io::copy(&mut source, target.as_file_mut())?;
    target.as_file().sync_all()?;
    target.persist(destination).map_err(|e| CoreError::Io(e.error))?;

    log::debug!("Copied {} to {}", staged.display(), destination.display());
    Ok(())
}
