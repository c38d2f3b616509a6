// ============================================================================
// stillreel-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// Every stage that shells out (probe, segment encode, final merge) goes through
// the single ToolRunner interface defined in `runner`, so exit-status handling
// and diagnostic capture live in one place. Segment inspection for the
// uniformity check lives in `inspector`.
//
// KEY COMPONENTS:
// - ToolRunner / SidecarRunner: run an invocation, map exit status to errors
// - StreamInspector / FfprobeInspector: read a segment's video stream signature
// - check_dependency / check_toolchain: availability checks for `doctor`
// - VideoFilterChain: filter graph assembly
//
// DESIGN PHILOSOPHY:
// Consumers inject the runner, so tests swap in the mocks from `mocks`.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};

use serde::Serialize;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

pub mod ffmpeg_builder;
pub mod inspector;
pub mod runner;

#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

pub use ffmpeg_builder::VideoFilterChain;
pub use inspector::{FfprobeInspector, StreamInspector, StreamSignature};
pub use runner::{SidecarRunner, Tool, ToolInvocation, ToolOutput, ToolRunner};

/// Checks that an external binary exists and can be started.
///
/// The binary is run with `-version`; only the ability to start it matters.
pub fn check_dependency(binary: &Path) -> CoreResult<()> {
    let name = binary.display().to_string();

    let result = Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", name);
            Err(CoreError::DependencyNotFound(name))
        }
        Err(e) => {
            log::error!("Failed to start dependency check for '{}': {}", name, e);
            Err(CoreError::CommandStart(name, e))
        }
    }
}

/// Availability of the external tools a job needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolchainStatus {
    pub ffmpeg: bool,
    pub ffprobe: bool,
}

impl ToolchainStatus {
    pub fn is_ready(&self) -> bool {
        self.ffmpeg && self.ffprobe
    }
}

/// Reports whether the configured ffmpeg and ffprobe binaries are usable.
pub fn check_toolchain(config: &CoreConfig) -> ToolchainStatus {
    ToolchainStatus {
        ffmpeg: check_dependency(&config.ffmpeg_path).is_ok(),
        ffprobe: check_dependency(&config.ffprobe_path).is_ok(),
    }
}

/// Filters ffmpeg log lines that show up on successful runs and would only
/// bury the real cause in a failure report.
pub(crate) fn is_non_critical_ffmpeg_message(line: &str) -> bool {
    line.contains("deprecated pixel format")
        || line.contains("No accelerated colorspace conversion")
        || line.contains("automatically inserted filter")
        || line.contains("Timestamps are unset")
        || line.contains("Queue input is backward")
        || line.starts_with("frame=")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_dependency_is_reported() {
        let missing = PathBuf::from("/definitely/not/here/ffmpeg-missing");
        match check_dependency(&missing) {
            Err(CoreError::DependencyNotFound(name)) => assert!(name.contains("ffmpeg-missing")),
            other => panic!("expected DependencyNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_toolchain_not_ready_with_bogus_paths() {
        let config = CoreConfig {
            ffmpeg_path: PathBuf::from("/nope/ffmpeg"),
            ffprobe_path: PathBuf::from("/nope/ffprobe"),
            ..Default::default()
        };
        let status = check_toolchain(&config);
        assert!(!status.ffmpeg);
        assert!(!status.ffprobe);
        assert!(!status.is_ready());
    }

    #[test]
    fn test_non_critical_filter() {
        assert!(is_non_critical_ffmpeg_message(
            "[swscaler @ 0x1] deprecated pixel format used, make sure you did set range correctly"
        ));
        assert!(!is_non_critical_ffmpeg_message(
            "[concat @ 0x1] Impossible to open 'segment_0001.mp4'"
        ));
    }
}
