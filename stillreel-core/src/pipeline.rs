// ============================================================================
// stillreel-core/src/pipeline.rs
// ============================================================================
//
// PIPELINE ORCHESTRATION: Audio + Images to One Video
//
// A job moves through a linear state machine:
//
//   Init → Probing → Synthesizing(0..N-1) → ManifestBuilding → Assembling → Done
//
// and any stage can end it in Failed. The first error halts the job and is
// returned as-is; no stage is retried.
//
// CLEANUP GUARANTEES:
// - The workspace is a scoped guard: it is closed on every exit path, and
//   dropping it removes the directory even if closing was skipped.
// - Segment files are discarded whether assembly succeeds or not; a synthesis
//   failure discards the segments created so far before the error surfaces.
// - The manifest removes itself when dropped, right after the merge.
// - A failed merge never leaves a partial output file behind.
//
// Segment encodes can run on a rayon pool (`synthesis_jobs > 1`). Results are
// collected in index order, so the manifest never depends on completion order,
// and the lowest failing index is the one reported.

use crate::assembler::{AssembleOptions, Assembler};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::events::{Event, EventDispatcher, EventHandler};
use crate::external::inspector::ensure_uniform;
use crate::external::{FfprobeInspector, StreamInspector, ToolRunner};
use crate::manifest::build_manifest;
use crate::probe::probe_duration;
use crate::synthesis::{Segment, SegmentSpec, SegmentSynthesizer, discard_segments, plan_segments};
use crate::utils::{format_duration, generate_output_filename};
use crate::workspace::{Workspace, publish_output};

use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// The stage a job is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Init,
    Probing,
    Synthesizing { index: usize },
    ManifestBuilding,
    Assembling,
    Done,
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Init => write!(f, "init"),
            JobStage::Probing => write!(f, "probing"),
            JobStage::Synthesizing { index } => write!(f, "synthesizing segment {index}"),
            JobStage::ManifestBuilding => write!(f, "building manifest"),
            JobStage::Assembling => write!(f, "assembling"),
            JobStage::Done => write!(f, "done"),
            JobStage::Failed => write!(f, "failed"),
        }
    }
}

/// One render request: an audio track and the images shown over it, in
/// display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaJob {
    pub audio_path: PathBuf,
    pub images: Vec<PathBuf>,
    /// File name for the result; generated when `None`
    pub output_filename: Option<String>,
}

impl MediaJob {
    pub fn new(audio_path: impl Into<PathBuf>, images: Vec<PathBuf>) -> Self {
        Self {
            audio_path: audio_path.into(),
            images,
            output_filename: None,
        }
    }

    #[must_use]
    pub fn with_output_filename(mut self, filename: impl Into<String>) -> Self {
        self.output_filename = Some(filename.into());
        self
    }

    /// Checks the preconditions that must hold before any tool runs.
    pub fn validate(&self) -> CoreResult<()> {
        if self.images.is_empty() {
            return Err(CoreError::EmptyInput);
        }

        if !self.audio_path.is_file() {
            return Err(CoreError::InputNotFound(self.audio_path.clone()));
        }

        if let Some(missing) = self.images.iter().find(|image| !image.is_file()) {
            return Err(CoreError::InputNotFound(missing.clone()));
        }

        if let Some(name) = &self.output_filename {
            let plain = Path::new(name)
                .file_name()
                .is_some_and(|file_name| file_name == name.as_str());
            if !plain {
                return Err(CoreError::Config(format!(
                    "output filename must be a bare file name, got {name:?}"
                )));
            }
        }

        Ok(())
    }
}

/// The finished video. The caller owns the file from here on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputVideo {
    pub file_path: PathBuf,
    pub filename: String,
    pub duration_secs: f64,
    pub segment_count: usize,
    pub elapsed_secs: f64,
}

/// Runs jobs against one configuration and tool runner.
pub struct Pipeline<'a, R: ToolRunner + ?Sized> {
    config: &'a CoreConfig,
    runner: &'a R,
    inspector: Option<&'a dyn StreamInspector>,
    events: EventDispatcher,
}

impl<'a, R: ToolRunner + ?Sized> Pipeline<'a, R> {
    pub fn new(config: &'a CoreConfig, runner: &'a R) -> Self {
        Self {
            config,
            runner,
            inspector: None,
            events: EventDispatcher::new(),
        }
    }

    /// Inspector used when `verify_segments` is on. Defaults to an
    /// `FfprobeInspector` running the configured `ffprobe_path`.
    #[must_use]
    pub fn with_inspector(mut self, inspector: &'a dyn StreamInspector) -> Self {
        self.inspector = Some(inspector);
        self
    }

    #[must_use]
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.events.add_handler(handler);
        self
    }

    /// Runs `job` to completion.
    ///
    /// On success the output video sits in `output_dir`; on failure nothing
    /// of the job remains on disk and the first error is returned.
    pub fn run(&self, job: &MediaJob) -> CoreResult<OutputVideo> {
        let started = Instant::now();

        self.config.validate()?;
        job.validate()?;

        log::info!(
            "Starting job: {} with {} image(s)",
            job.audio_path.display(),
            job.images.len()
        );
        self.events.emit(Event::JobStarted {
            audio_path: job.audio_path.display().to_string(),
            image_count: job.images.len(),
        });

        let result = self.run_job(job, started);

        match &result {
            Ok(output) => {
                self.enter(JobStage::Done);
                log::info!(
                    "Job finished in {}: {}",
                    format_duration(output.elapsed_secs),
                    output.file_path.display()
                );
                self.events.emit(Event::JobCompleted {
                    output_path: output.file_path.display().to_string(),
                    filename: output.filename.clone(),
                    duration_secs: output.duration_secs,
                    segment_count: output.segment_count,
                    elapsed: started.elapsed(),
                });
            }
            Err(e) => {
                self.enter(JobStage::Failed);
                log::error!("Job failed: {}", e);
                self.events.emit(Event::JobFailed {
                    stage: e.stage(),
                    message: e.to_string(),
                });
            }
        }

        result
    }

    fn enter(&self, stage: JobStage) {
        log::info!("Stage: {}", stage);
        self.events.emit(Event::StageChanged { stage });
    }

    fn run_job(&self, job: &MediaJob, started: Instant) -> CoreResult<OutputVideo> {
        self.enter(JobStage::Init);

        std::fs::create_dir_all(&self.config.output_dir)?;
        let output_dir = std::path::absolute(&self.config.output_dir)?;
        let filename = job
            .output_filename
            .clone()
            .unwrap_or_else(generate_output_filename);
        let output_path = output_dir.join(&filename);

        let workspace = Workspace::create(self.config.temp_dir.as_deref())?;
        let outcome = self.run_in_workspace(job, &workspace, &filename, &output_path);

        // Cleanup failures are reported but never replace the job's result
        if let Err(e) = workspace.close() {
            log::warn!("{}", e);
        }

        let (duration_secs, segment_count) = outcome?;
        Ok(OutputVideo {
            file_path: output_path,
            filename,
            duration_secs,
            segment_count,
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }

    fn run_in_workspace(
        &self,
        job: &MediaJob,
        workspace: &Workspace,
        filename: &str,
        output_path: &Path,
    ) -> CoreResult<(f64, usize)> {
        self.enter(JobStage::Probing);
        let duration = probe_duration(self.runner, &job.audio_path)?;
        let plan = plan_segments(duration, &job.images, self.config.frame_rate)?;

        let segments = self.synthesize_all(&plan, workspace)?;
        let merged = self.merge(job, workspace, &segments, filename, output_path);
        discard_segments(&segments);
        merged?;

        Ok((duration.as_secs(), segments.len()))
    }

    fn synthesize_all(
        &self,
        plan: &[SegmentSpec],
        workspace: &Workspace,
    ) -> CoreResult<Vec<Segment>> {
        let synthesizer = SegmentSynthesizer::new(self.runner, self.config);
        let jobs = self.config.synthesis_jobs.min(plan.len()).max(1);

        log::info!(
            "Synthesizing {} segment(s) of {:.3}s ({} frames each) with {} job(s)",
            plan.len(),
            plan.first().map(|s| s.allotted_duration).unwrap_or_default(),
            plan.first().map(|s| s.frame_count).unwrap_or_default(),
            jobs
        );

        if jobs == 1 {
            self.synthesize_sequential(&synthesizer, plan, workspace)
        } else {
            self.synthesize_parallel(&synthesizer, plan, workspace, jobs)
        }
    }

    fn synthesize_sequential(
        &self,
        synthesizer: &SegmentSynthesizer<'_, R>,
        plan: &[SegmentSpec],
        workspace: &Workspace,
    ) -> CoreResult<Vec<Segment>> {
        let mut segments = Vec::with_capacity(plan.len());
        for spec in plan {
            self.enter(JobStage::Synthesizing { index: spec.index });
            match synthesizer.synthesize(spec, &workspace.segment_path(spec.index)) {
                Ok(segment) => {
                    segments.push(segment);
                    self.events.emit(Event::SegmentEncoded {
                        index: spec.index,
                        total: plan.len(),
                    });
                }
                Err(e) => {
                    discard_segments(&segments);
                    return Err(e);
                }
            }
        }
        Ok(segments)
    }

    fn synthesize_parallel(
        &self,
        synthesizer: &SegmentSynthesizer<'_, R>,
        plan: &[SegmentSpec],
        workspace: &Workspace,
        jobs: usize,
    ) -> CoreResult<Vec<Segment>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| CoreError::Config(format!("Failed to initialize thread pool: {e}")))?;

        let abort = AtomicBool::new(false);
        let results: Vec<Option<CoreResult<Segment>>> = pool.install(|| {
            plan.par_iter()
                .map(|spec| {
                    // Segments not yet started are skipped once any has failed
                    if abort.load(Ordering::SeqCst) {
                        return None;
                    }
                    self.enter(JobStage::Synthesizing { index: spec.index });
                    let result = synthesizer.synthesize(spec, &workspace.segment_path(spec.index));
                    match &result {
                        Ok(_) => self.events.emit(Event::SegmentEncoded {
                            index: spec.index,
                            total: plan.len(),
                        }),
                        Err(_) => abort.store(true, Ordering::SeqCst),
                    }
                    Some(result)
                })
                .collect()
        });

        let mut segments = Vec::with_capacity(plan.len());
        let mut first_error = None;
        for result in results.into_iter().flatten() {
            match result {
                Ok(segment) => segments.push(segment),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_error {
            discard_segments(&segments);
            return Err(e);
        }
        Ok(segments)
    }

    fn merge(
        &self,
        job: &MediaJob,
        workspace: &Workspace,
        segments: &[Segment],
        filename: &str,
        output_path: &Path,
    ) -> CoreResult<()> {
        self.enter(JobStage::ManifestBuilding);
        let manifest = build_manifest(&workspace.manifest_path(), segments)?;

        self.enter(JobStage::Assembling);
        self.verify_uniform(segments)?;

        // The merge lands in the workspace first; only a complete file is
        // moved over `output_path`.
        let staged = workspace.staged_output_path(filename);
        Assembler::new(self.runner, AssembleOptions::from_config(self.config)).assemble(
            manifest.path(),
            &job.audio_path,
            &staged,
        )?;

        publish_output(&staged, output_path).map_err(|source| CoreError::MergeFailed {
            source: Box::new(source),
        })?;
        log::info!("Published {}", output_path.display());
        Ok(())
    }

    fn verify_uniform(&self, segments: &[Segment]) -> CoreResult<()> {
        if !self.config.verify_segments {
            return Ok(());
        }

        let default_inspector = FfprobeInspector::from_config(self.config);
        let inspector: &dyn StreamInspector = match self.inspector {
            Some(inspector) => inspector,
            None => &default_inspector,
        };

        let signatures = segments
            .iter()
            .map(|segment| {
                inspector
                    .video_signature(&segment.file_path)
                    .map_err(|source| match source {
                        // The inspector itself is unusable; no segment is at fault
                        CoreError::CommandStart(..) | CoreError::DependencyNotFound(_) => source,
                        source => CoreError::SegmentEncodeFailed {
                            index: segment.index,
                            source: Box::new(source),
                        },
                    })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        ensure_uniform(&signatures)?;
        log::debug!("All {} segments share {}", signatures.len(), signatures[0]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_stage_display() {
        assert_eq!(JobStage::Probing.to_string(), "probing");
        assert_eq!(
            JobStage::Synthesizing { index: 4 }.to_string(),
            "synthesizing segment 4"
        );
    }

    #[test]
    fn test_validate_rejects_empty_images() {
        let job = MediaJob::new("/nowhere/a.mp3", Vec::new());
        assert!(matches!(job.validate(), Err(CoreError::EmptyInput)));
    }

    #[test]
    fn test_validate_rejects_missing_files() {
        let dir = tempdir().unwrap();
        let audio = dir.path().join("a.mp3");
        let image = dir.path().join("1.png");
        std::fs::write(&audio, b"a").unwrap();

        let job = MediaJob::new(&audio, vec![image.clone()]);
        match job.validate() {
            Err(CoreError::InputNotFound(path)) => assert_eq!(path, image),
            other => panic!("expected InputNotFound, got {:?}", other),
        }

        let job = MediaJob::new(dir.path().join("missing.mp3"), vec![image]);
        assert!(matches!(job.validate(), Err(CoreError::InputNotFound(_))));
    }

    #[test]
    fn test_validate_output_filename() {
        let dir = tempdir().unwrap();
        let audio = dir.path().join("a.mp3");
        let image = dir.path().join("1.png");
        std::fs::write(&audio, b"a").unwrap();
        std::fs::write(&image, b"i").unwrap();

        let job = MediaJob::new(&audio, vec![image.clone()]).with_output_filename("final.mp4");
        assert!(job.validate().is_ok());

        let job = MediaJob::new(&audio, vec![image]).with_output_filename("../escape.mp4");
        assert!(matches!(job.validate(), Err(CoreError::Config(_))));
    }
}
