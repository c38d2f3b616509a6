// ============================================================================
// stillreel-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig. Every setter is optional; anything left
// untouched keeps the value from CoreConfig::default().

use std::path::PathBuf;

use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use stillreel_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .output_dir(PathBuf::from("/tmp/out"))
///     .encoder_preset("veryfast")
///     .crf(20)
///     .build();
/// assert_eq!(config.crf, 20);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new builder seeded with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory receiving finished videos.
    pub fn output_dir(mut self, output_dir: PathBuf) -> Self {
        self.config.output_dir = output_dir;
        self
    }

    /// Sets the parent directory for per-job workspaces.
    pub fn temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.config.temp_dir = Some(temp_dir);
        self
    }

    pub fn ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.config.ffmpeg_path = path;
        self
    }

    pub fn ffprobe_path(mut self, path: PathBuf) -> Self {
        self.config.ffprobe_path = path;
        self
    }

    pub fn frame_rate(mut self, frame_rate: u32) -> Self {
        self.config.frame_rate = frame_rate;
        self
    }

    /// Sets the output frame geometry.
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn zoom_step(mut self, zoom_step: f64) -> Self {
        self.config.zoom_step = zoom_step;
        self
    }

    pub fn max_zoom(mut self, max_zoom: f64) -> Self {
        self.config.max_zoom = max_zoom;
        self
    }

    pub fn video_codec(mut self, codec: &str) -> Self {
        self.config.video_codec = codec.to_string();
        self
    }

    pub fn pixel_format(mut self, pixel_format: &str) -> Self {
        self.config.pixel_format = pixel_format.to_string();
        self
    }

    pub fn encoder_preset(mut self, preset: &str) -> Self {
        self.config.encoder_preset = preset.to_string();
        self
    }

    pub fn crf(mut self, crf: u8) -> Self {
        self.config.crf = crf;
        self
    }

    pub fn audio_codec(mut self, codec: &str) -> Self {
        self.config.audio_codec = codec.to_string();
        self
    }

    pub fn faststart(mut self, enabled: bool) -> Self {
        self.config.faststart = enabled;
        self
    }

    /// Number of segments encoded concurrently.
    pub fn synthesis_jobs(mut self, jobs: usize) -> Self {
        self.config.synthesis_jobs = jobs;
        self
    }

    pub fn verify_segments(mut self, enabled: bool) -> Self {
        self.config.verify_segments = enabled;
        self
    }

    /// Builds the configuration. Call `CoreConfig::validate` before use.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
