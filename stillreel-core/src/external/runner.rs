// ============================================================================
// stillreel-core/src/external/runner.rs
// ============================================================================
//
// TOOL RUNNER: The One Way Stillreel Runs External Tools
//
// A ToolInvocation names the tool, carries its arguments and a label used in
// logs and errors. A ToolRunner executes it and returns the exit status, the
// captured stdout and the diagnostic text. `ToolRunner::run` turns a non-zero
// exit into CoreError::CommandFailed, so no stage checks exit codes itself.
//
// SidecarRunner is the production implementation: ffmpeg runs through
// ffmpeg-sidecar (its log events become the diagnostics), ffprobe runs as a
// plain captured process because only its stdout matters.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use crate::external::is_non_critical_ffmpeg_message;

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Number of trailing ffmpeg log lines kept as diagnostics.
const DIAGNOSTIC_TAIL_LINES: usize = 40;

/// The external tools stillreel invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Ffmpeg => write!(f, "ffmpeg"),
            Tool::Ffprobe => write!(f, "ffprobe"),
        }
    }
}

/// A single external tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool: Tool,
    /// Human-readable context, e.g. "ffmpeg (segment 2)"
    pub label: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(tool: Tool, label: impl Into<String>) -> Self {
        Self {
            tool,
            label: label.into(),
            args: Vec::new(),
        }
    }

    pub fn ffmpeg(context: &str) -> Self {
        Self::new(Tool::Ffmpeg, format!("ffmpeg ({context})"))
    }

    pub fn ffprobe(context: &str) -> Self {
        Self::new(Tool::Ffprobe, format!("ffprobe ({context})"))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// The last argument, which is the output file for every ffmpeg call
    /// stillreel makes.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.args.last().map(PathBuf::from)
    }

    /// Shell-like rendering for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.tool.to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(' ') || arg.contains('\'') || arg.is_empty() {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// What an external tool produced.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    /// stderr (ffprobe) or the tail of the log event stream (ffmpeg)
    pub diagnostics: String,
}

/// Narrow interface over external tool execution.
pub trait ToolRunner: Send + Sync {
    /// Executes the invocation and reports whatever the tool produced.
    /// Only failure to start or wait on the process is an error here.
    fn execute(&self, invocation: &ToolInvocation) -> CoreResult<ToolOutput>;

    /// Executes the invocation and fails with `CommandFailed` on a
    /// non-zero exit status.
    fn run(&self, invocation: &ToolInvocation) -> CoreResult<ToolOutput> {
        log::debug!("Running {}: {}", invocation.label, invocation.command_line());

        let output = self.execute(invocation)?;
        if !output.status.success() {
            let diagnostics = if output.diagnostics.trim().is_empty() {
                "no diagnostic output".to_string()
            } else {
                output.diagnostics.trim().to_string()
            };
            log::error!(
                "{} failed with {}:\n{}",
                invocation.label,
                output.status,
                diagnostics
            );
            return Err(command_failed_error(
                invocation.label.clone(),
                output.status,
                diagnostics,
            ));
        }
        Ok(output)
    }
}

/// Production runner backed by ffmpeg-sidecar and std::process.
#[derive(Debug, Clone)]
pub struct SidecarRunner {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl Default for SidecarRunner {
    fn default() -> Self {
        Self::new(PathBuf::from("ffmpeg"), PathBuf::from("ffprobe"))
    }
}

impl SidecarRunner {
    pub fn new(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone())
    }

    fn execute_ffmpeg(&self, invocation: &ToolInvocation) -> CoreResult<ToolOutput> {
        let mut cmd = FfmpegCommand::new_with_path(&self.ffmpeg_path);
        cmd.hide_banner();
        cmd.args(&invocation.args);

        let mut child = cmd
            .spawn()
            .map_err(|e| command_start_error(invocation.label.clone(), e))?;

        let events = child.iter().map_err(|e| {
            command_start_error(
                invocation.label.clone(),
                io::Error::other(format!("failed to read ffmpeg events: {e}")),
            )
        })?;

        // Keep only the tail: the cause of a failure is printed last
        let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);
        for event in events {
            let line = match event {
                FfmpegEvent::Log(_, line) | FfmpegEvent::Error(line) => line,
                _ => continue,
            };
            if line.trim().is_empty() || is_non_critical_ffmpeg_message(&line) {
                continue;
            }
            if tail.len() == DIAGNOSTIC_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }

        let status = child.wait().map_err(|e| {
            log::error!("Failed waiting on {}: {}", invocation.label, e);
            CoreError::Io(e)
        })?;

        Ok(ToolOutput {
            status,
            stdout: String::new(),
            diagnostics: Vec::from(tail).join("\n"),
        })
    }

    fn execute_ffprobe(&self, invocation: &ToolInvocation) -> CoreResult<ToolOutput> {
        let output = Command::new(&self.ffprobe_path)
            .args(&invocation.args)
            .output()
            .map_err(|e| command_start_error(invocation.label.clone(), e))?;

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl ToolRunner for SidecarRunner {
    fn execute(&self, invocation: &ToolInvocation) -> CoreResult<ToolOutput> {
        match invocation.tool {
            Tool::Ffmpeg => self.execute_ffmpeg(invocation),
            Tool::Ffprobe => self.execute_ffprobe(invocation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = ToolInvocation::ffmpeg("segment 0")
            .args(["-loop", "1"])
            .arg("-i")
            .path_arg(Path::new("/in/a.png"))
            .arg("-y")
            .path_arg(Path::new("/ws/segment_0000.mp4"));

        assert_eq!(inv.tool, Tool::Ffmpeg);
        assert_eq!(inv.label, "ffmpeg (segment 0)");
        assert_eq!(inv.args[0], "-loop");
        assert_eq!(inv.output_path(), Some(PathBuf::from("/ws/segment_0000.mp4")));
    }

    #[test]
    fn test_command_line_quotes_awkward_args() {
        let inv = ToolInvocation::ffprobe("duration")
            .arg("-v")
            .arg("error")
            .arg("/music/my song.mp3");
        assert_eq!(inv.command_line(), "ffprobe -v error \"/music/my song.mp3\"");
    }

    #[test]
    fn test_sidecar_runner_reports_spawn_failure() {
        let runner = SidecarRunner::new(
            PathBuf::from("/no/such/ffmpeg"),
            PathBuf::from("/no/such/ffprobe"),
        );
        let inv = ToolInvocation::ffprobe("duration").arg("-version");
        match runner.run(&inv) {
            Err(CoreError::CommandStart(label, _)) => assert_eq!(label, "ffprobe (duration)"),
            other => panic!("expected CommandStart, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_display() {
        assert_eq!(Tool::Ffmpeg.to_string(), "ffmpeg");
        assert_eq!(Tool::Ffprobe.to_string(), "ffprobe");
    }
}
