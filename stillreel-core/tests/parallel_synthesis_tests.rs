// stillreel-core/tests/parallel_synthesis_tests.rs

mod common;

use common::{Fixture, ManifestCapture, manifest_file_names};
use stillreel_core::error::CoreError;
use stillreel_core::external::Tool;
use stillreel_core::external::mocks::MockToolRunner;
use stillreel_core::pipeline::{MediaJob, Pipeline};
use stillreel_core::workspace::segment_file_name;

#[test]
fn test_parallel_manifest_keeps_input_order() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::new(8);
    let mut config = fixture.config();
    config.synthesis_jobs = 4;

    let mock = MockToolRunner::new();
    mock.expect_probe("16.0");
    mock.expect_segments(8);
    mock.expect_ffmpeg_success("concat");
    let runner = ManifestCapture::new(mock.clone());

    let job = MediaJob::new(&fixture.audio, fixture.images.clone());
    let output = Pipeline::new(&config, &runner).run(&job)?;
    assert_eq!(output.segment_count, 8);

    let manifests = runner.manifests();
    let expected: Vec<String> = (0..8).map(segment_file_name).collect();
    assert_eq!(manifest_file_names(&manifests[0].1), expected);

    assert_eq!(mock.calls_for(Tool::Ffmpeg), 9);
    assert_eq!(fixture.scratch_entries(), 0);
    Ok(())
}

#[test]
fn test_parallel_failure_leaves_no_segments() {
    let fixture = Fixture::new(6);
    let mut config = fixture.config();
    config.synthesis_jobs = 3;

    let runner = MockToolRunner::new();
    runner.expect_probe("12.0");
    for index in [0, 2, 3, 4, 5] {
        runner.expect_ffmpeg_success(&segment_file_name(index));
    }
    runner.expect_ffmpeg_failure(&segment_file_name(1), 1, "Conversion failed!");

    let job = MediaJob::new(&fixture.audio, fixture.images.clone());
    let err = Pipeline::new(&config, &runner).run(&job).unwrap_err();

    match err {
        CoreError::SegmentEncodeFailed { index, .. } => assert_eq!(index, 1),
        other => panic!("expected SegmentEncodeFailed, got {:?}", other),
    }
    // The merge never ran
    assert!(
        runner
            .get_received_calls()
            .iter()
            .all(|call| !call.args.iter().any(|arg| arg == "concat"))
    );
    assert_eq!(fixture.scratch_entries(), 0);
    assert!(fixture.output_entries().is_empty());
}

#[test]
fn test_lowest_failing_index_is_reported() {
    let fixture = Fixture::new(4);
    let mut config = fixture.config();
    config.synthesis_jobs = 4;

    let runner = MockToolRunner::new();
    runner.expect_probe("8.0");
    runner.expect_ffmpeg_success(&segment_file_name(0));
    runner.expect_ffmpeg_failure(&segment_file_name(1), 1, "first");
    runner.expect_ffmpeg_success(&segment_file_name(2));
    runner.expect_ffmpeg_failure(&segment_file_name(3), 1, "second");

    let job = MediaJob::new(&fixture.audio, fixture.images.clone());
    let err = Pipeline::new(&config, &runner).run(&job).unwrap_err();

    // Either failing segment may be skipped after the other fails; when both
    // ran, the lower index wins
    let ran = |index: usize| {
        let name = segment_file_name(index);
        runner
            .get_received_calls()
            .iter()
            .any(|call| call.args.iter().any(|arg| arg.contains(&name)))
    };
    let expected = if ran(1) { 1 } else { 3 };
    assert_eq!(err.segment_index(), Some(expected));
    assert_eq!(fixture.scratch_entries(), 0);
}
