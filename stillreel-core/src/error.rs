// ============================================================================
// stillreel-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Core Error Types for the Stillreel Pipeline
//
// Every failure a job can end with is a `CoreError`. Stage failures wrap the
// underlying tool failure as their source, so the caller sees both the
// classification (which stage, which segment) and the tool diagnostics.
//
// KEY COMPONENTS:
// - CoreError: the error enum
// - CoreResult: result alias
// - command_start_error / command_failed_error: constructors used by runners

use crate::pipeline::JobStage;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors produced by the stillreel pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    // ---- Preconditions ----
    #[error("No images supplied; at least one image is required")]
    EmptyInput,

    #[error("Input file not found or not a regular file: {}", .0.display())]
    InputNotFound(PathBuf),

    // ---- Duration stage ----
    #[error("Duration probe failed: {source}")]
    ProbeFailed {
        #[source]
        source: Box<CoreError>,
    },

    #[error("Could not parse probed duration from output {raw:?}")]
    DurationParse { raw: String },

    #[error("Audio duration is zero; nothing to render")]
    ZeroDuration,

    // ---- Synthesis stage ----
    #[error("Encoding segment {index} failed: {source}")]
    SegmentEncodeFailed {
        index: usize,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Segment {index} does not match segment 0: expected {expected}, found {actual}")]
    IncompatibleSegments {
        index: usize,
        expected: String,
        actual: String,
    },

    // ---- Manifest stage ----
    #[error("Failed to write concat manifest {}: {source}", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // ---- Assembly stage ----
    #[error("Final merge failed: {source}")]
    MergeFailed {
        #[source]
        source: Box<CoreError>,
    },

    // ---- Cleanup (logged, never returned from a job) ----
    #[error("Failed to clean up {}: {source}", path.display())]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // ---- External tool plumbing ----
    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("{tool} exited with {status}: {diagnostics}")]
    CommandFailed {
        tool: String,
        status: ExitStatus,
        diagnostics: String,
    },

    #[error("Required dependency '{0}' not found")]
    DependencyNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for stillreel-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// The pipeline stage this error belongs to, if it is a stage failure.
    pub fn stage(&self) -> Option<JobStage> {
        match self {
            CoreError::EmptyInput | CoreError::InputNotFound(_) => Some(JobStage::Init),
            CoreError::ProbeFailed { .. }
            | CoreError::DurationParse { .. }
            | CoreError::ZeroDuration => Some(JobStage::Probing),
            CoreError::SegmentEncodeFailed { index, .. } => {
                Some(JobStage::Synthesizing { index: *index })
            }
            CoreError::ManifestWrite { .. } => Some(JobStage::ManifestBuilding),
            CoreError::IncompatibleSegments { .. } | CoreError::MergeFailed { .. } => {
                Some(JobStage::Assembling)
            }
            _ => None,
        }
    }

    /// True when the failure is caused by what the caller submitted rather
    /// than by the tools or the host environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CoreError::EmptyInput
                | CoreError::InputNotFound(_)
                | CoreError::DurationParse { .. }
                | CoreError::ZeroDuration
        )
    }

    /// Index of the failing segment for synthesis and uniformity failures.
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            CoreError::SegmentEncodeFailed { index, .. }
            | CoreError::IncompatibleSegments { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Diagnostic text captured from the external tool, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            CoreError::CommandFailed { diagnostics, .. } => Some(diagnostics),
            CoreError::ProbeFailed { source }
            | CoreError::SegmentEncodeFailed { source, .. }
            | CoreError::MergeFailed { source } => source.diagnostics(),
            _ => None,
        }
    }
}

/// Error for a tool that could not be spawned at all.
pub fn command_start_error(tool: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(tool.into(), err)
}

/// Error for a tool that ran and exited unsuccessfully.
pub fn command_failed_error(
    tool: impl Into<String>,
    status: ExitStatus,
    diagnostics: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        tool: tool.into(),
        status,
        diagnostics: diagnostics.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        assert_eq!(CoreError::EmptyInput.stage(), Some(JobStage::Init));
        assert_eq!(CoreError::ZeroDuration.stage(), Some(JobStage::Probing));

        let err = CoreError::SegmentEncodeFailed {
            index: 3,
            source: Box::new(CoreError::DependencyNotFound("ffmpeg".into())),
        };
        assert_eq!(err.stage(), Some(JobStage::Synthesizing { index: 3 }));
        assert_eq!(err.segment_index(), Some(3));
        assert!(!err.is_input_error());

        assert!(CoreError::DependencyNotFound("ffmpeg".into()).stage().is_none());
    }

    #[test]
    fn test_input_errors() {
        assert!(CoreError::EmptyInput.is_input_error());
        assert!(CoreError::InputNotFound(PathBuf::from("/missing.png")).is_input_error());
        assert!(CoreError::DurationParse { raw: "N/A".into() }.is_input_error());
        assert!(!CoreError::Config("bad".into()).is_input_error());
    }

    #[test]
    fn test_merge_failure_message_carries_diagnostics() {
        let err = CoreError::MergeFailed {
            source: Box::new(CoreError::CommandStart(
                "ffmpeg".into(),
                io::Error::new(io::ErrorKind::NotFound, "no such file"),
            )),
        };
        let message = err.to_string();
        assert!(message.contains("Final merge failed"));
        assert!(message.contains("no such file"));
    }
}
