// ============================================================================
// stillreel-core/src/synthesis.rs
// ============================================================================
//
// SEGMENT SYNTHESIS: One Motion Clip per Still Image
//
// The audio duration is split equally across the images. Each image is held
// as a looping single frame for its allotted time and rendered through the
// same filter graph: scale to cover the output frame, centre crop to the exact
// geometry, then a centre-anchored zoom that grows per frame up to a cap.
//
// Every segment is encoded with the same EncodingProfile (codec, pixel format,
// preset, CRF, frame rate, no audio). The final merge stream-copies segments,
// which is only valid while those parameters are identical.
//
// KEY COMPONENTS:
// - plan_segments: timing plan (equal split, frame counts)
// - MotionProfile / EncodingProfile: the per-job render parameters
// - SegmentSynthesizer: runs one encode and classifies its failure
// - discard_segments: removes segment files after a run

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{ToolInvocation, ToolRunner, VideoFilterChain};
use crate::probe::AudioDuration;

use std::path::{Path, PathBuf};

/// Frames rendered for a segment of `allotted_secs` at `frame_rate`.
///
/// `floor(allotted × fps)`, never less than one frame.
pub fn frame_count(allotted_secs: f64, frame_rate: u32) -> u32 {
    let frames = (allotted_secs * f64::from(frame_rate)).floor();
    if frames.is_finite() && frames >= 1.0 {
        frames.min(f64::from(u32::MAX)) as u32
    } else {
        1
    }
}

/// Timing of one segment before it is encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpec {
    pub index: usize,
    pub source_image: PathBuf,
    /// Seconds on screen
    pub allotted_duration: f64,
    pub frame_count: u32,
}

/// Splits `duration` equally across `images`, in input order.
pub fn plan_segments(
    duration: AudioDuration,
    images: &[PathBuf],
    frame_rate: u32,
) -> CoreResult<Vec<SegmentSpec>> {
    if images.is_empty() {
        return Err(CoreError::EmptyInput);
    }
    if duration.is_zero() {
        return Err(CoreError::ZeroDuration);
    }

    let allotted = duration.as_secs() / images.len() as f64;
    let frames = frame_count(allotted, frame_rate);

    Ok(images
        .iter()
        .enumerate()
        .map(|(index, image)| SegmentSpec {
            index,
            source_image: image.clone(),
            allotted_duration: allotted,
            frame_count: frames,
        })
        .collect())
}

/// An encoded segment on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub source_image: PathBuf,
    pub allotted_duration: f64,
    pub frame_count: u32,
    pub file_path: PathBuf,
}

/// Output geometry and zoom curve.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionProfile {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub zoom_step: f64,
    pub max_zoom: f64,
}

impl MotionProfile {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            frame_rate: config.frame_rate,
            zoom_step: config.zoom_step,
            max_zoom: config.max_zoom,
        }
    }

    /// Zoom factor at output frame `frame` (0-based): starts at 1.0, never
    /// decreases, never exceeds `max_zoom`.
    pub fn zoom_at(&self, frame: u32) -> f64 {
        (1.0 + self.zoom_step * f64::from(frame)).min(self.max_zoom)
    }

    /// The filter graph for a segment of `frame_count` frames.
    pub fn filter_graph(&self, frame_count: u32) -> String {
        VideoFilterChain::new()
            .add_scale_to_fill(self.width, self.height)
            .add_center_crop(self.width, self.height)
            .add_center_zoom(
                self.zoom_step,
                self.max_zoom,
                frame_count,
                self.width,
                self.height,
                self.frame_rate,
            )
            .build()
    }
}

/// Encoder settings shared by every segment of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingProfile {
    pub video_codec: String,
    pub pixel_format: String,
    pub preset: String,
    pub crf: u8,
    pub frame_rate: u32,
}

impl EncodingProfile {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            video_codec: config.video_codec.clone(),
            pixel_format: config.pixel_format.clone(),
            preset: config.encoder_preset.clone(),
            crf: config.crf,
            frame_rate: config.frame_rate,
        }
    }
}

/// Builds the ffmpeg call for one segment. The output path is the last
/// argument.
pub fn build_segment_invocation(
    spec: &SegmentSpec,
    motion: &MotionProfile,
    encoding: &EncodingProfile,
    output_path: &Path,
) -> ToolInvocation {
    ToolInvocation::ffmpeg(&format!("segment {}", spec.index))
        .args(["-loop", "1"])
        .arg("-i")
        .path_arg(&spec.source_image)
        // Exactly frame_count frames, at least one
        .arg("-frames:v")
        .arg(spec.frame_count.to_string())
        .arg("-vf")
        .arg(motion.filter_graph(spec.frame_count))
        .arg("-c:v")
        .arg(encoding.video_codec.as_str())
        .arg("-pix_fmt")
        .arg(encoding.pixel_format.as_str())
        .arg("-preset")
        .arg(encoding.preset.as_str())
        .arg("-crf")
        .arg(encoding.crf.to_string())
        .arg("-r")
        .arg(encoding.frame_rate.to_string())
        .arg("-an")
        .arg("-y")
        .path_arg(output_path)
}

/// Encodes segments through a `ToolRunner`.
pub struct SegmentSynthesizer<'a, R: ToolRunner + ?Sized> {
    runner: &'a R,
    motion: MotionProfile,
    encoding: EncodingProfile,
}

impl<'a, R: ToolRunner + ?Sized> SegmentSynthesizer<'a, R> {
    pub fn new(runner: &'a R, config: &CoreConfig) -> Self {
        Self {
            runner,
            motion: MotionProfile::from_config(config),
            encoding: EncodingProfile::from_config(config),
        }
    }

    pub fn motion(&self) -> &MotionProfile {
        &self.motion
    }

    pub fn encoding(&self) -> &EncodingProfile {
        &self.encoding
    }

    /// Encodes one segment to `output_path`.
    ///
    /// Any failure is reported as `SegmentEncodeFailed` for this index, and
    /// whatever the encoder left at `output_path` is removed first.
    pub fn synthesize(&self, spec: &SegmentSpec, output_path: &Path) -> CoreResult<Segment> {
        log::debug!(
            "Synthesizing segment {} from {} ({:.3}s, {} frames)",
            spec.index,
            spec.source_image.display(),
            spec.allotted_duration,
            spec.frame_count
        );

        let invocation = build_segment_invocation(spec, &self.motion, &self.encoding, output_path);
        let result = self.runner.run(&invocation).and_then(|_| {
            if output_path.is_file() {
                Ok(())
            } else {
                Err(CoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("encoder produced no file at {}", output_path.display()),
                )))
            }
        });

        if let Err(source) = result {
            remove_partial(output_path);
            return Err(CoreError::SegmentEncodeFailed {
                index: spec.index,
                source: Box::new(source),
            });
        }

        Ok(Segment {
            index: spec.index,
            source_image: spec.source_image.clone(),
            allotted_duration: spec.allotted_duration,
            frame_count: spec.frame_count,
            file_path: output_path.to_path_buf(),
        })
    }
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Could not remove partial segment {}: {}", path.display(), e);
        }
    }
}

/// Deletes the files of `segments`, logging failures. Returns how many
/// files were removed.
pub fn discard_segments(segments: &[Segment]) -> usize {
    let mut removed = 0;
    for segment in segments {
        match std::fs::remove_file(&segment.file_path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                let err = CoreError::CleanupFailed {
                    path: segment.file_path.clone(),
                    source,
                };
                log::warn!("{}", err);
            }
        }
    }
    if removed > 0 {
        log::debug!("Discarded {} segment file(s)", removed);
    }
    removed
}
