// ============================================================================
// stillreel-cli/src/commands/render.rs
// ============================================================================
//
// RENDER COMMAND: Audio + Images -> Video
//
// Maps the command-line arguments onto a CoreConfig and a MediaJob, runs the
// pipeline with the production SidecarRunner and reports the result. Progress
// goes to an indicatif bar, or to stdout as NDJSON events with --json.

use crate::cli::RenderArgs;
use crate::output;

use anyhow::Result;
use std::sync::Arc;
use stillreel_core::events::EventHandler;
use stillreel_core::{
    CoreConfig, CoreConfigBuilder, JsonEventHandler, MediaJob, Pipeline, SidecarRunner,
};

/// Builds the core configuration for a render.
pub fn build_config(args: &RenderArgs) -> CoreConfig {
    let mut builder = CoreConfigBuilder::new()
        .output_dir(args.output_dir.clone())
        .ffmpeg_path(args.tools.ffmpeg.clone())
        .ffprobe_path(args.tools.ffprobe.clone())
        .frame_rate(args.fps)
        .dimensions(args.width, args.height)
        .zoom_step(args.zoom_step)
        .max_zoom(args.max_zoom)
        .encoder_preset(&args.preset)
        .crf(args.crf)
        .faststart(!args.no_faststart)
        .synthesis_jobs(args.jobs)
        .verify_segments(args.verify_segments);

    if let Some(temp_dir) = &args.temp_dir {
        builder = builder.temp_dir(temp_dir.clone());
    }
    builder.build()
}

/// Builds the job for a render.
pub fn build_job(args: &RenderArgs) -> MediaJob {
    let job = MediaJob::new(args.audio.clone(), args.images.clone());
    match &args.output_name {
        Some(name) => job.with_output_filename(name.clone()),
        None => job,
    }
}

pub fn run_render(args: RenderArgs) -> Result<()> {
    let config = build_config(&args);
    config.validate()?;
    let job = build_job(&args);

    log::info!(
        "Rendering {} image(s) over {} into {}",
        job.images.len(),
        job.audio_path.display(),
        config.output_dir.display()
    );

    let handler: Arc<dyn EventHandler> = if args.json {
        Arc::new(JsonEventHandler::new())
    } else {
        Arc::new(output::ProgressReporter::new())
    };

    let runner = SidecarRunner::from_config(&config);
    let result = Pipeline::new(&config, &runner)
        .with_event_handler(handler)
        .run(&job)?;

    if !args.json {
        output::print_render_summary(&result);
    }
    Ok(())
}
