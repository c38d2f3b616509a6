//! Video stream inspection for the segment uniformity check.
//!
//! Stream-copy concatenation is only valid when every segment shares codec,
//! profile, geometry and pixel format. `StreamInspector` reads those values
//! from an encoded segment so the pipeline can compare them before merging.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use ffprobe::{Config, FfProbeError, ffprobe_config};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The stream parameters that must match across concatenated segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSignature {
    pub codec: String,
    pub profile: Option<String>,
    pub width: u32,
    pub height: u32,
    pub pixel_format: Option<String>,
}

impl fmt::Display for StreamSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {}x{} {}",
            self.codec,
            self.profile.as_deref().unwrap_or("no profile"),
            self.width,
            self.height,
            self.pixel_format.as_deref().unwrap_or("unknown pix_fmt")
        )
    }
}

/// Reads the video stream signature of an encoded file.
pub trait StreamInspector: Send + Sync {
    fn video_signature(&self, path: &Path) -> CoreResult<StreamSignature>;
}

/// Inspector backed by the `ffprobe` crate, running the configured binary.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    ffprobe_bin: PathBuf,
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeInspector {
    pub fn new(ffprobe_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.ffprobe_path.clone())
    }

    pub fn ffprobe_bin(&self) -> &Path {
        &self.ffprobe_bin
    }
}

impl StreamInspector for FfprobeInspector {
    fn video_signature(&self, path: &Path) -> CoreResult<StreamSignature> {
        log::debug!(
            "Inspecting video stream of {} with {}",
            path.display(),
            self.ffprobe_bin.display()
        );

        let config = Config::builder().ffprobe_bin(&self.ffprobe_bin).build();
        let metadata = ffprobe_config(config, path).map_err(|err| {
            log::error!("ffprobe failed on {}: {:?}", path.display(), err);
            map_ffprobe_error(err)
        })?;

        let stream = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| {
                CoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("no video stream in {}", path.display()),
                ))
            })?;

        let dimension = |value: Option<i64>| -> u32 {
            value.filter(|v| *v > 0).map(|v| v as u32).unwrap_or(0)
        };

        Ok(StreamSignature {
            codec: stream.codec_name.clone().unwrap_or_default(),
            profile: stream.profile.clone(),
            width: dimension(stream.width),
            height: dimension(stream.height),
            pixel_format: stream.pix_fmt.clone(),
        })
    }
}

fn map_ffprobe_error(err: FfProbeError) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error("ffprobe (inspect)", io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error("ffprobe (inspect)", output.status, stderr)
        }
        other => CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unreadable ffprobe output: {other:?}"),
        )),
    }
}

/// Checks that every signature matches the first one.
///
/// Returns `IncompatibleSegments` naming the first deviating index.
pub fn ensure_uniform(signatures: &[StreamSignature]) -> CoreResult<()> {
    let Some(reference) = signatures.first() else {
        return Ok(());
    };

    for (index, signature) in signatures.iter().enumerate().skip(1) {
        if signature != reference {
            return Err(CoreError::IncompatibleSegments {
                index,
                expected: reference.to_string(),
                actual: signature.to_string(),
            });
        }
    }
    Ok(())
}
