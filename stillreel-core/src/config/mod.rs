//! Configuration structures and constants for the stillreel-core library.
//!
//! This module holds the parameters every job shares: where output lands,
//! which tool binaries to invoke, the frame geometry, the motion curve and the
//! encoding profile that keeps all segments stream-copy compatible.

mod builder;

use crate::error::{CoreError, CoreResult};
use std::path::PathBuf;

pub use builder::CoreConfigBuilder;

// Default constants

/// Output frame rate shared by every segment.
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Portrait output width in pixels.
pub const DEFAULT_WIDTH: u32 = 1080;

/// Portrait output height in pixels.
pub const DEFAULT_HEIGHT: u32 = 1920;

/// Zoom added per output frame of a segment.
pub const DEFAULT_ZOOM_STEP: f64 = 0.002;

/// Upper bound of the zoom factor.
pub const DEFAULT_MAX_ZOOM: f64 = 1.3;

/// Video encoder used for every segment.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";

/// Pixel format used for every segment.
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// x264 CPU-effort preset.
pub const DEFAULT_ENCODER_PRESET: &str = "medium";

/// Constant rate factor for segment encodes (0-51, lower is better quality).
pub const DEFAULT_CRF: u8 = 23;

/// Delivery audio codec for the final mux.
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Main configuration structure for the stillreel-core library.
///
/// Only `output_dir` usually needs to be set; everything else defaults to the
/// 1080x1920 / 30 fps / libx264 profile.
///
/// # Examples
///
/// ```rust
/// use stillreel_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .output_dir(PathBuf::from("/srv/renders"))
///     .frame_rate(30)
///     .max_zoom(1.25)
///     .synthesis_jobs(4)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory receiving the final video (outside the job workspace)
    pub output_dir: PathBuf,

    /// Parent directory for job workspaces (system temp dir when `None`)
    pub temp_dir: Option<PathBuf>,

    /// ffmpeg binary
    pub ffmpeg_path: PathBuf,

    /// ffprobe binary
    pub ffprobe_path: PathBuf,

    /// Output frame rate
    pub frame_rate: u32,

    /// Output width in pixels (must be even)
    pub width: u32,

    /// Output height in pixels (must be even)
    pub height: u32,

    /// Zoom increment per frame
    pub zoom_step: f64,

    /// Zoom cap
    pub max_zoom: f64,

    pub video_codec: String,

    pub pixel_format: String,

    pub encoder_preset: String,

    pub crf: u8,

    pub audio_codec: String,

    /// Relocate container metadata to the front of the output
    pub faststart: bool,

    /// Number of segments encoded concurrently (1 = sequential)
    pub synthesis_jobs: usize,

    /// Inspect every segment's stream parameters before concatenation
    pub verify_segments: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            temp_dir: None,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            frame_rate: DEFAULT_FRAME_RATE,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            zoom_step: DEFAULT_ZOOM_STEP,
            max_zoom: DEFAULT_MAX_ZOOM,
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            encoder_preset: DEFAULT_ENCODER_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            faststart: true,
            synthesis_jobs: 1,
            verify_segments: false,
        }
    }
}

impl CoreConfig {
    /// Creates a configuration writing output to `output_dir` with all other
    /// settings at their defaults.
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            ..Default::default()
        }
    }

    /// Checks the configuration for values that would break the pipeline.
    pub fn validate(&self) -> CoreResult<()> {
        if self.frame_rate == 0 {
            return Err(CoreError::Config("frame_rate must be at least 1".to_string()));
        }

        if self.width == 0 || self.height == 0 {
            return Err(CoreError::Config(format!(
                "output dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        // yuv420p chroma subsampling needs even dimensions
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(CoreError::Config(format!(
                "output dimensions must be even, got {}x{}",
                self.width, self.height
            )));
        }

        if !self.zoom_step.is_finite() || self.zoom_step <= 0.0 {
            return Err(CoreError::Config(format!(
                "zoom_step must be positive, got {}",
                self.zoom_step
            )));
        }

        if !self.max_zoom.is_finite() || self.max_zoom < 1.0 {
            return Err(CoreError::Config(format!(
                "max_zoom must be at least 1.0, got {}",
                self.max_zoom
            )));
        }

        if self.crf > 51 {
            return Err(CoreError::Config(format!(
                "crf must be in 0-51, got {}",
                self.crf
            )));
        }

        if self.synthesis_jobs == 0 {
            return Err(CoreError::Config(
                "synthesis_jobs must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("video_codec", &self.video_codec),
            ("pixel_format", &self.pixel_format),
            ("encoder_preset", &self.encoder_preset),
            ("audio_codec", &self.audio_codec),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Config(format!("{name} must not be empty")));
            }
        }

        Ok(())
    }
}
