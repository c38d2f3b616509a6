//! Final concatenation and audio mux.
//!
//! Segments are concatenated with the concat demuxer and stream-copied; the
//! audio track is re-encoded to the delivery codec. `-shortest` trims the
//! result to the shorter of the two streams, so rounding drift between the
//! probed duration and the rendered segments is absorbed here.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{ToolInvocation, ToolRunner};

use std::path::Path;

/// Options for the final mux.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleOptions {
    /// Delivery audio codec
    pub audio_codec: String,

    /// Move the moov atom to the front for progressive playback
    pub faststart: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            audio_codec: crate::config::DEFAULT_AUDIO_CODEC.to_string(),
            faststart: true,
        }
    }
}

impl AssembleOptions {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            audio_codec: config.audio_codec.clone(),
            faststart: config.faststart,
        }
    }
}

/// Builds the concat + mux ffmpeg call. The output path is the last
/// argument.
pub fn build_assemble_invocation(
    manifest_path: &Path,
    audio_path: &Path,
    output_path: &Path,
    options: &AssembleOptions,
) -> ToolInvocation {
    let mut invocation = ToolInvocation::ffmpeg("merge")
        .args(["-f", "concat", "-safe", "0", "-i"])
        .path_arg(manifest_path)
        .arg("-i")
        .path_arg(audio_path)
        // Video only from the segments, audio only from the track; cover art
        // in the audio file must never become the video stream.
        .args(["-map", "0:v:0", "-map", "1:a:0"])
        .args(["-c:v", "copy"])
        .arg("-c:a")
        .arg(options.audio_codec.as_str())
        .arg("-shortest");

    if options.faststart {
        invocation = invocation.args(["-movflags", "+faststart"]);
    }

    invocation.arg("-y").path_arg(output_path)
}

/// Runs the final merge.
pub struct Assembler<'a, R: ToolRunner + ?Sized> {
    runner: &'a R,
    options: AssembleOptions,
}

impl<'a, R: ToolRunner + ?Sized> Assembler<'a, R> {
    pub fn new(runner: &'a R, options: AssembleOptions) -> Self {
        Self { runner, options }
    }

    /// Concatenates the manifest's segments with `audio_path` into
    /// `output_path`.
    ///
    /// Fails with `MergeFailed` carrying the tool diagnostics. On failure no
    /// file is left at `output_path`; an empty output counts as a failure.
    pub fn assemble(
        &self,
        manifest_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> CoreResult<()> {
        log::info!("Merging segments into {}", output_path.display());

        let invocation =
            build_assemble_invocation(manifest_path, audio_path, output_path, &self.options);

        let result = self
            .runner
            .run(&invocation)
            .and_then(|_| verify_output(output_path));

        if let Err(source) = result {
            if output_path.exists() {
                match std::fs::remove_file(output_path) {
                    Ok(()) => log::debug!("Removed partial output {}", output_path.display()),
                    Err(e) => log::warn!(
                        "Could not remove partial output {}: {}",
                        output_path.display(),
                        e
                    ),
                }
            }
            return Err(CoreError::MergeFailed {
                source: Box::new(source),
            });
        }
        Ok(())
    }
}

fn verify_output(output_path: &Path) -> CoreResult<()> {
    let metadata = std::fs::metadata(output_path)?;
    if metadata.len() == 0 {
        return Err(CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("merge produced an empty file at {}", output_path.display()),
        )));
    }
    Ok(())
}
