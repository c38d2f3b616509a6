// stillreel-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use stillreel_core::config::{
    DEFAULT_CRF, DEFAULT_ENCODER_PRESET, DEFAULT_FRAME_RATE, DEFAULT_HEIGHT, DEFAULT_MAX_ZOOM,
    DEFAULT_WIDTH, DEFAULT_ZOOM_STEP,
};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Stillreel: audio + still images to vertical video",
    long_about = "Renders one zoom/pan segment per image, sized to an equal share of the \
                  audio duration, and stitches them with the audio track using ffmpeg."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Optional: Directory for a timestamped run log (console-only logging when absent)
    #[arg(long, global = true, value_name = "LOG_DIR", env = "STILLREEL_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Renders a video from an audio track and an ordered list of images
    Render(RenderArgs),

    /// Checks that ffmpeg and ffprobe can be started
    Doctor(DoctorArgs),
}

/// Locations of the external tools.
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// ffmpeg binary
    #[arg(long, value_name = "PATH", env = "STILLREEL_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe binary
    #[arg(long, value_name = "PATH", env = "STILLREEL_FFPROBE", default_value = "ffprobe")]
    pub ffprobe: PathBuf,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Audio track; its duration sets the video length
    #[arg(short = 'a', long = "audio", required = true, value_name = "AUDIO")]
    pub audio: PathBuf,

    /// Image to show, in display order (repeat the flag for each image)
    #[arg(short = 'i', long = "image", value_name = "IMAGE")]
    pub images: Vec<PathBuf>,

    /// Directory where the finished video is written
    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "OUTPUT_DIR",
        env = "STILLREEL_OUTPUT_DIR",
        default_value = "."
    )]
    pub output_dir: PathBuf,

    /// Optional: File name for the video (default: video_<unix time>_<random>.mp4)
    #[arg(long, value_name = "NAME")]
    pub output_name: Option<String>,

    /// Optional: Parent directory for the per-run workspace (default: system temp dir)
    #[arg(long, value_name = "DIR", env = "STILLREEL_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    // --- Geometry & Motion ---
    /// Output frame rate
    #[arg(long, value_name = "FPS", env = "STILLREEL_FPS", default_value_t = DEFAULT_FRAME_RATE)]
    pub fps: u32,

    /// Output width in pixels (must be even)
    #[arg(long, value_name = "PIXELS", default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// Output height in pixels (must be even)
    #[arg(long, value_name = "PIXELS", default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// Zoom added per frame
    #[arg(long, value_name = "STEP", default_value_t = DEFAULT_ZOOM_STEP)]
    pub zoom_step: f64,

    /// Maximum zoom factor
    #[arg(long, value_name = "FACTOR", default_value_t = DEFAULT_MAX_ZOOM)]
    pub max_zoom: f64,

    // --- Encoding ---
    /// x264 preset for segment encodes
    #[arg(long, value_name = "PRESET", env = "STILLREEL_PRESET", default_value = DEFAULT_ENCODER_PRESET)]
    pub preset: String,

    /// Segment quality (CRF, 0-51, lower is better)
    #[arg(
        long,
        value_name = "CRF",
        default_value_t = DEFAULT_CRF,
        value_parser = clap::value_parser!(u8).range(0..=51)
    )]
    pub crf: u8,

    /// Number of segments encoded concurrently
    #[arg(short = 'j', long, value_name = "N", env = "STILLREEL_JOBS", default_value_t = 1)]
    pub jobs: usize,

    /// Inspect every segment's stream parameters before merging
    #[arg(long, default_value_t = false)]
    pub verify_segments: bool,

    /// Do not move container metadata to the front of the file
    #[arg(long, default_value_t = false)]
    pub no_faststart: bool,

    /// Emit NDJSON events on stdout instead of human-readable output
    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub tools: ToolArgs,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub tools: ToolArgs,
}
