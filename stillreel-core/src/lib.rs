//! Core library turning one audio track and an ordered set of still images
//! into a single vertical video.
//!
//! A job probes the audio duration with ffprobe, renders one zoom/pan segment
//! per image with ffmpeg, writes a concat manifest and stream-copies the
//! segments together with the audio into the final container. All external
//! tool calls go through the [`ToolRunner`] trait.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use stillreel_core::{CoreConfig, MediaJob, Pipeline, SidecarRunner};
//! use std::path::PathBuf;
//!
//! let config = CoreConfig::new(PathBuf::from("/srv/renders"));
//! config.validate().unwrap();
//!
//! let runner = SidecarRunner::from_config(&config);
//! let job = MediaJob::new(
//!     "/srv/uploads/track.mp3",
//!     vec![PathBuf::from("/srv/uploads/a.jpg"), PathBuf::from("/srv/uploads/b.jpg")],
//! );
//!
//! let output = Pipeline::new(&config, &runner).run(&job).unwrap();
//! println!("{} -> {}", output.filename, output.file_path.display());
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod events;
pub mod external;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod probe;
pub mod synthesis;
pub mod utils;
pub mod workspace;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use events::{Event, EventDispatcher, EventHandler, JsonEventHandler};
pub use external::{
    SidecarRunner, StreamInspector, ToolInvocation, ToolOutput, ToolRunner, ToolchainStatus,
    check_dependency, check_toolchain,
};
pub use pipeline::{JobStage, MediaJob, OutputVideo, Pipeline};
pub use probe::{AudioDuration, probe_duration};
pub use utils::{format_duration, generate_output_filename};

use std::path::{Path, PathBuf};

/// Renders `images` over `audio_path` with the production tool runner.
///
/// Shorthand for building a `MediaJob` and running it through a `Pipeline`
/// backed by `SidecarRunner`.
pub fn render_video(
    config: &CoreConfig,
    audio_path: &Path,
    images: &[PathBuf],
) -> CoreResult<OutputVideo> {
    let runner = SidecarRunner::from_config(config);
    let job = MediaJob::new(audio_path, images.to_vec());
    Pipeline::new(config, &runner).run(&job)
}
