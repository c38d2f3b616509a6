// stillreel-cli/src/output.rs
//
// Human-readable terminal output: headings, label/value lines, the final
// report and the segment progress bar.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use stillreel_core::events::{Event, EventHandler};
use stillreel_core::{CoreError, OutputVideo, ToolchainStatus, format_duration};

/// Print a heading with a separator line
pub fn print_heading(text: &str) {
    let line = "=".repeat(50);
    println!("\n{}", style(&line).blue().bright());
    println!("{}", style(format!(" {} ", text)).bold().white());
    println!("{}\n", style(&line).blue().bright());
}

/// Print a label/value pair with the label highlighted
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("{}: {}", style(label).cyan().bright(), value);
}

pub fn print_success(message: &str) {
    println!("{} {}", style("[OK]").green().bold(), message);
}

pub fn print_render_summary(output: &OutputVideo) {
    print_heading("Render complete");
    print_info("Output file", output.file_path.display());
    print_info("Filename", &output.filename);
    print_info("Audio duration", format_duration(output.duration_secs));
    print_info("Segments", output.segment_count);
    print_info("Elapsed", format_duration(output.elapsed_secs));
}

pub fn print_toolchain_status(status: &ToolchainStatus) {
    for (name, ok) in [("ffmpeg", status.ffmpeg), ("ffprobe", status.ffprobe)] {
        if ok {
            println!("{} {}", style("[OK]").green().bold(), name);
        } else {
            println!("{} {} missing", style("[FAIL]").red().bold(), name);
        }
    }
}

/// Print a failure to stderr, classified when it came from the pipeline.
pub fn print_error(err: &anyhow::Error) {
    let prefix = style("Error:").red().bold();
    match err.downcast_ref::<CoreError>() {
        Some(core) => {
            let class = if core.is_input_error() {
                "input"
            } else {
                "tool/environment"
            };
            match core.stage() {
                Some(stage) => eprintln!("{} [{} during {}] {}", prefix, class, stage, err),
                None => eprintln!("{} [{}] {}", prefix, class, err),
            }
            if let Some(diagnostics) = core.diagnostics() {
                eprintln!("{}", style("Tool output:").yellow());
                for line in diagnostics.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
        None => eprintln!("{} {:#}", prefix, err),
    }
}

/// Exit code for a failed command: 2 for bad input, 1 for everything else.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CoreError>() {
        Some(core) if core.is_input_error() => 2,
        _ => 1,
    }
}

/// Segment progress bar driven by pipeline events.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let bar_style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        bar.set_style(bar_style);
        Self { bar }
    }
}

impl EventHandler for ProgressReporter {
    fn handle(&self, event: &Event) {
        match event {
            Event::JobStarted { image_count, .. } => {
                self.bar.set_length(*image_count as u64);
                self.bar.set_message("starting");
            }
            Event::StageChanged { stage } => {
                self.bar.set_message(stage.to_string());
            }
            Event::SegmentEncoded { .. } => {
                self.bar.inc(1);
            }
            Event::JobCompleted { .. } | Event::JobFailed { .. } => {
                self.bar.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let input = anyhow::Error::new(CoreError::EmptyInput);
        assert_eq!(exit_code(&input), 2);

        let missing = anyhow::Error::new(CoreError::InputNotFound(PathBuf::from("/x.png")))
            .context("render failed");
        assert_eq!(exit_code(&missing), 2);

        let tool = anyhow::Error::new(CoreError::DependencyNotFound("ffmpeg".into()));
        assert_eq!(exit_code(&tool), 1);

        assert_eq!(exit_code(&anyhow::anyhow!("plain")), 1);
    }

    #[test]
    fn test_progress_reporter_counts_segments() {
        let reporter = ProgressReporter::new();
        reporter.handle(&Event::JobStarted {
            audio_path: "track.mp3".into(),
            image_count: 3,
        });
        reporter.handle(&Event::SegmentEncoded { index: 0, total: 3 });
        reporter.handle(&Event::SegmentEncoded { index: 2, total: 3 });
        assert_eq!(reporter.bar.length(), Some(3));
        assert_eq!(reporter.bar.position(), 2);
    }
}
