// stillreel-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for unit tests and when the "test-mocks" feature is enabled.
// State sits behind Arc<Mutex<..>> because the pipeline may call the runner
// from a rayon pool.

use super::inspector::{StreamInspector, StreamSignature};
use super::runner::{Tool, ToolInvocation, ToolOutput, ToolRunner};
use crate::error::{CoreError, CoreResult, command_start_error};
pub use crate::workspace::segment_file_name;
use std::collections::HashMap;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};

/// How a mocked invocation ends.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Exit 0 with the given stdout.
    Success { stdout: String },
    /// Non-zero exit with diagnostics on stderr.
    ExitFailure { code: i32, diagnostics: String },
    /// The process never starts.
    SpawnError(String),
}

/// An expected invocation and its mocked result.
#[derive(Debug, Clone)]
pub struct MockExpectation {
    pub tool: Tool,
    /// Matched against every argument by substring.
    pub arg_pattern: String,
    pub outcome: MockOutcome,
    /// Write a small file at the invocation's output path on success.
    pub create_dummy_output: bool,
}

/// Mock ToolRunner supporting multiple one-shot expectations.
#[derive(Clone, Default)]
pub struct MockToolRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    received_calls: Arc<Mutex<Vec<ToolInvocation>>>,
}

impl MockToolRunner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_expectation(&self, expectation: MockExpectation) {
        self.expectations
            .lock()
            .expect("mock expectations poisoned")
            .push(expectation);
    }

    /// ffprobe prints `stdout` and exits 0.
    pub fn expect_probe(&self, stdout: &str) {
        self.add_expectation(MockExpectation {
            tool: Tool::Ffprobe,
            arg_pattern: "format=duration".to_string(),
            outcome: MockOutcome::Success {
                stdout: stdout.to_string(),
            },
            create_dummy_output: false,
        });
    }

    /// ffprobe exits with `code`.
    pub fn expect_probe_failure(&self, code: i32, diagnostics: &str) {
        self.add_expectation(MockExpectation {
            tool: Tool::Ffprobe,
            arg_pattern: "format=duration".to_string(),
            outcome: MockOutcome::ExitFailure {
                code,
                diagnostics: diagnostics.to_string(),
            },
            create_dummy_output: false,
        });
    }

    /// ffmpeg call with an argument containing `arg_pattern` succeeds and
    /// writes a dummy output file.
    pub fn expect_ffmpeg_success(&self, arg_pattern: &str) {
        self.add_expectation(MockExpectation {
            tool: Tool::Ffmpeg,
            arg_pattern: arg_pattern.to_string(),
            outcome: MockOutcome::Success {
                stdout: String::new(),
            },
            create_dummy_output: true,
        });
    }

    /// ffmpeg call with an argument containing `arg_pattern` exits non-zero.
    pub fn expect_ffmpeg_failure(&self, arg_pattern: &str, code: i32, diagnostics: &str) {
        self.add_expectation(MockExpectation {
            tool: Tool::Ffmpeg,
            arg_pattern: arg_pattern.to_string(),
            outcome: MockOutcome::ExitFailure {
                code,
                diagnostics: diagnostics.to_string(),
            },
            create_dummy_output: false,
        });
    }

    /// ffmpeg call with an argument containing `arg_pattern` cannot start.
    pub fn expect_ffmpeg_spawn_error(&self, arg_pattern: &str, message: &str) {
        self.add_expectation(MockExpectation {
            tool: Tool::Ffmpeg,
            arg_pattern: arg_pattern.to_string(),
            outcome: MockOutcome::SpawnError(message.to_string()),
            create_dummy_output: false,
        });
    }

    /// Expects one successful encode per segment index in `0..count`.
    pub fn expect_segments(&self, count: usize) {
        for index in 0..count {
            self.expect_ffmpeg_success(&segment_file_name(index));
        }
    }

    pub fn get_received_calls(&self) -> Vec<ToolInvocation> {
        self.received_calls
            .lock()
            .expect("mock calls poisoned")
            .clone()
    }

    pub fn calls_for(&self, tool: Tool) -> usize {
        self.get_received_calls()
            .iter()
            .filter(|inv| inv.tool == tool)
            .count()
    }

    /// Expectations that were never matched.
    pub fn pending_expectations(&self) -> usize {
        self.expectations.lock().expect("mock expectations poisoned").len()
    }
}

fn exit_status(code: i32) -> ExitStatus {
    // Raw wait status: exit code lives in the second byte
    ExitStatus::from_raw(code << 8)
}

impl ToolRunner for MockToolRunner {
    fn execute(&self, invocation: &ToolInvocation) -> CoreResult<ToolOutput> {
        self.received_calls
            .lock()
            .expect("mock calls poisoned")
            .push(invocation.clone());

        let expectation = {
            let mut expectations = self.expectations.lock().expect("mock expectations poisoned");
            let found = expectations.iter().position(|exp| {
                exp.tool == invocation.tool
                    && invocation.args.iter().any(|arg| arg.contains(&exp.arg_pattern))
            });
            match found {
                Some(index) => expectations.remove(index),
                None => {
                    log::error!(
                        "MockToolRunner: No expectation found for {}",
                        invocation.command_line()
                    );
                    panic!(
                        "MockToolRunner: No expectation found for {}",
                        invocation.command_line()
                    );
                }
            }
        };

        log::info!(
            "MockToolRunner: Matched expectation with pattern '{}'",
            expectation.arg_pattern
        );

        match expectation.outcome {
            MockOutcome::Success { stdout } => {
                if expectation.create_dummy_output {
                    if let Some(output_path) = invocation.output_path() {
                        if let Some(parent) = output_path.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        std::fs::write(&output_path, b"dummy media")?;
                    }
                }
                Ok(ToolOutput {
                    status: exit_status(0),
                    stdout,
                    diagnostics: String::new(),
                })
            }
            MockOutcome::ExitFailure { code, diagnostics } => Ok(ToolOutput {
                status: exit_status(code),
                stdout: String::new(),
                diagnostics,
            }),
            MockOutcome::SpawnError(message) => Err(command_start_error(
                invocation.label.clone(),
                io::Error::new(io::ErrorKind::NotFound, message),
            )),
        }
    }
}

/// Mock StreamInspector returning configured signatures.
#[derive(Clone, Default)]
pub struct MockStreamInspector {
    default_signature: Option<StreamSignature>,
    signatures: Arc<Mutex<HashMap<PathBuf, StreamSignature>>>,
    inspected: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockStreamInspector {
    /// Every path reports `signature` unless overridden.
    pub fn uniform(signature: StreamSignature) -> Self {
        Self {
            default_signature: Some(signature),
            ..Default::default()
        }
    }

    /// Overrides the signature for files whose name is `file_name`.
    pub fn expect_signature(&self, file_name: &str, signature: StreamSignature) {
        self.signatures
            .lock()
            .expect("mock signatures poisoned")
            .insert(PathBuf::from(file_name), signature);
    }

    pub fn inspected_paths(&self) -> Vec<PathBuf> {
        self.inspected.lock().expect("mock inspections poisoned").clone()
    }
}

impl StreamInspector for MockStreamInspector {
    fn video_signature(&self, path: &Path) -> CoreResult<StreamSignature> {
        self.inspected
            .lock()
            .expect("mock inspections poisoned")
            .push(path.to_path_buf());

        let by_name = path
            .file_name()
            .map(PathBuf::from)
            .and_then(|name| {
                self.signatures
                    .lock()
                    .expect("mock signatures poisoned")
                    .get(&name)
                    .cloned()
            });

        by_name
            .or_else(|| self.default_signature.clone())
            .ok_or_else(|| {
                CoreError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("MockStreamInspector: no signature for {}", path.display()),
                ))
            })
    }
}

/// The signature a default-config segment would have.
pub fn default_segment_signature() -> StreamSignature {
    StreamSignature {
        codec: "h264".to_string(),
        profile: Some("High".to_string()),
        width: 1080,
        height: 1920,
        pixel_format: Some("yuv420p".to_string()),
    }
}
