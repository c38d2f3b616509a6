//! Audio duration probing.
//!
//! The duration is read once per job and every later timing value derives
//! from it. ffprobe is asked for the container-level duration only, printed
//! as a bare number, so parsing is a single token.

use crate::error::{CoreError, CoreResult};
use crate::external::{ToolInvocation, ToolRunner};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Playback length of the audio track in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct AudioDuration(f64);

impl AudioDuration {
    /// Wraps a duration, rejecting negative and non-finite values.
    pub fn from_secs(seconds: f64) -> Option<Self> {
        (seconds.is_finite() && seconds >= 0.0).then_some(Self(seconds))
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl fmt::Display for AudioDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

/// The ffprobe call that prints only `format=duration`.
pub fn build_probe_invocation(audio_path: &Path) -> ToolInvocation {
    ToolInvocation::ffprobe("duration")
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "csv=p=0"])
        .path_arg(audio_path)
}

/// Parses probe output that must hold exactly one non-negative number.
pub fn parse_duration(raw: &str) -> CoreResult<AudioDuration> {
    let mut tokens = raw.split_whitespace();
    let parse_failure = || CoreError::DurationParse {
        raw: raw.trim().to_string(),
    };

    let token = tokens.next().ok_or_else(parse_failure)?;
    if tokens.next().is_some() {
        return Err(parse_failure());
    }

    token
        .parse::<f64>()
        .ok()
        .and_then(AudioDuration::from_secs)
        .ok_or_else(parse_failure)
}

/// Measures the playback duration of `audio_path`.
///
/// A tool failure becomes `ProbeFailed`; unusable output becomes
/// `DurationParse`. There is no retry.
pub fn probe_duration<R: ToolRunner + ?Sized>(
    runner: &R,
    audio_path: &Path,
) -> CoreResult<AudioDuration> {
    let invocation = build_probe_invocation(audio_path);
    let output = runner
        .run(&invocation)
        .map_err(|source| CoreError::ProbeFailed {
            source: Box::new(source),
        })?;

    let duration = parse_duration(&output.stdout)?;
    log::info!("Audio duration of {}: {}", audio_path.display(), duration);
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mocks::MockToolRunner;
    use crate::external::Tool;

    #[test]
    fn test_parse_valid_durations() {
        assert_eq!(parse_duration("9.000000\n").unwrap().as_secs(), 9.0);
        assert_eq!(parse_duration("  12.5  ").unwrap().as_secs(), 12.5);
        assert!(parse_duration("0").unwrap().is_zero());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "\n", "N/A", "-1.0", "inf", "NaN", "3.0 4.0", "duration=3.0"] {
            match parse_duration(raw) {
                Err(CoreError::DurationParse { .. }) => {}
                other => panic!("{raw:?} should not parse, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_probe_invocation_requests_only_duration() {
        let inv = build_probe_invocation(Path::new("/audio/track.mp3"));
        assert_eq!(inv.tool, Tool::Ffprobe);
        assert_eq!(
            inv.args,
            vec![
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "csv=p=0",
                "/audio/track.mp3"
            ]
        );
    }

    #[test]
    fn test_probe_duration_success() {
        let runner = MockToolRunner::new();
        runner.expect_probe("9.000000\n");
        let duration = probe_duration(&runner, Path::new("/audio/track.mp3")).unwrap();
        assert_eq!(duration.as_secs(), 9.0);
        assert_eq!(runner.calls_for(Tool::Ffprobe), 1);
    }

    #[test]
    fn test_probe_exit_failure_is_probe_failed() {
        let runner = MockToolRunner::new();
        runner.expect_probe_failure(1, "track.mp3: Invalid data found when processing input");
        let err = probe_duration(&runner, Path::new("/audio/track.mp3")).unwrap_err();
        assert!(matches!(err, CoreError::ProbeFailed { .. }));
        assert!(err.diagnostics().unwrap().contains("Invalid data"));
    }

    #[test]
    fn test_probe_unparseable_output() {
        let runner = MockToolRunner::new();
        runner.expect_probe("N/A\n");
        let err = probe_duration(&runner, Path::new("/audio/track.mp3")).unwrap_err();
        assert!(matches!(err, CoreError::DurationParse { raw } if raw == "N/A"));
    }
}
