// stillreel-core/tests/common/mod.rs
//
// Shared fixtures for the pipeline integration tests.

#![allow(dead_code)]

use stillreel_core::config::CoreConfig;
use stillreel_core::error::CoreResult;
use stillreel_core::events::{Event, EventHandler};
use stillreel_core::external::mocks::MockToolRunner;
use stillreel_core::external::{ToolInvocation, ToolOutput, ToolRunner};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Input files plus separate output and workspace parents.
pub struct Fixture {
    pub input: TempDir,
    pub output: TempDir,
    pub scratch: TempDir,
    pub audio: PathBuf,
    pub images: Vec<PathBuf>,
}

impl Fixture {
    pub fn new(image_count: usize) -> Self {
        let input = tempfile::tempdir().expect("input dir");
        let output = tempfile::tempdir().expect("output dir");
        let scratch = tempfile::tempdir().expect("scratch dir");

        let audio = create_dummy_file(input.path(), "track.mp3");
        let images = (0..image_count)
            .map(|i| create_dummy_file(input.path(), &format!("image_{i}.png")))
            .collect();

        Self {
            input,
            output,
            scratch,
            audio,
            images,
        }
    }

    pub fn config(&self) -> CoreConfig {
        CoreConfig {
            output_dir: self.output.path().to_path_buf(),
            temp_dir: Some(self.scratch.path().to_path_buf()),
            ..Default::default()
        }
    }

    /// Files and directories left under the workspace parent.
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch.path())
            .expect("read scratch dir")
            .count()
    }

    pub fn output_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.output.path())
            .expect("read output dir")
            .map(|entry| entry.expect("dir entry").path())
            .collect()
    }
}

pub fn create_dummy_file(dir: &Path, filename: &str) -> PathBuf {
    let file_path = dir.join(filename);
    let mut file = File::create(&file_path).expect("Failed to create dummy file");
    file.write_all(b"dummy content")
        .expect("Failed to write dummy content");
    file_path
}

/// Runner that records the concat manifest while the merge runs, then
/// delegates to the mock.
pub struct ManifestCapture {
    pub inner: MockToolRunner,
    manifests: Mutex<Vec<(PathBuf, String)>>,
}

impl ManifestCapture {
    pub fn new(inner: MockToolRunner) -> Self {
        Self {
            inner,
            manifests: Mutex::new(Vec::new()),
        }
    }

    pub fn manifests(&self) -> Vec<(PathBuf, String)> {
        self.manifests.lock().unwrap().clone()
    }
}

impl ToolRunner for ManifestCapture {
    fn execute(&self, invocation: &ToolInvocation) -> CoreResult<ToolOutput> {
        if invocation.args.iter().any(|arg| arg == "concat") {
            let at = invocation
                .args
                .iter()
                .position(|arg| arg == "-i")
                .expect("merge has inputs");
            let path = PathBuf::from(&invocation.args[at + 1]);
            let text = std::fs::read_to_string(&path).expect("manifest exists during merge");
            self.manifests.lock().unwrap().push((path, text));
        }
        self.inner.execute(invocation)
    }
}

/// Event handler that keeps everything it sees.
#[derive(Default)]
pub struct EventRecorder {
    events: Mutex<Vec<Event>>,
}

impl EventRecorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl EventHandler for EventRecorder {
    fn handle(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Segment file names referenced by manifest text, in order.
pub fn manifest_file_names(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let path = line
                .strip_prefix("file '")
                .and_then(|rest| rest.strip_suffix('\''))
                .expect("manifest line format");
            Path::new(path)
                .file_name()
                .expect("file name")
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}
