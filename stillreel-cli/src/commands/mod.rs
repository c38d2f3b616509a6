//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// `doctor`: reports whether ffmpeg and ffprobe are usable.
pub mod doctor;

/// `render`: runs one job through the stillreel-core pipeline.
pub mod render;
