use assert_cmd::Command;
use predicates::str::contains;
use std::error::Error;
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn stillreel_cmd() -> Command {
    let mut cmd = Command::cargo_bin("stillreel").expect("Failed to find stillreel binary");
    for var in [
        "STILLREEL_FFMPEG",
        "STILLREEL_FFPROBE",
        "STILLREEL_OUTPUT_DIR",
        "STILLREEL_LOG_DIR",
        "STILLREEL_TEMP_DIR",
        "STILLREEL_JOBS",
        "STILLREEL_FPS",
        "STILLREEL_PRESET",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_commands() {
    stillreel_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("render"))
        .stdout(contains("doctor"));
}

#[test]
fn test_render_requires_audio() {
    stillreel_cmd()
        .args(["render", "--image", "a.png"])
        .assert()
        .failure()
        .stderr(contains("--audio"));
}

#[test]
fn test_render_without_images_is_input_error() -> Result<(), Box<dyn Error>> {
    let output_dir = tempdir()?;

    stillreel_cmd()
        .arg("render")
        .arg("--audio")
        .arg("track.mp3")
        .arg("--output-dir")
        .arg(output_dir.path())
        // Would fail with a different error if any tool were started
        .args(["--ffmpeg", "/nonexistent/ffmpeg", "--ffprobe", "/nonexistent/ffprobe"])
        .assert()
        .code(2)
        .stderr(contains("No images supplied"));

    assert_eq!(std::fs::read_dir(output_dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_render_with_missing_audio_is_input_error() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let image = input_dir.path().join("a.png");
    std::fs::write(&image, "dummy content")?;

    stillreel_cmd()
        .arg("render")
        .arg("--audio")
        .arg(input_dir.path().join("missing.mp3"))
        .arg("--image")
        .arg(&image)
        .args(["--ffmpeg", "/nonexistent/ffmpeg", "--ffprobe", "/nonexistent/ffprobe"])
        .assert()
        .code(2)
        .stderr(contains("missing.mp3"));
    Ok(())
}

#[test]
fn test_render_rejects_odd_dimensions() {
    stillreel_cmd()
        .args(["render", "--audio", "track.mp3", "--image", "a.png", "--width", "1081"])
        .assert()
        .code(1)
        .stderr(contains("even"));
}

#[test]
fn test_render_rejects_crf_out_of_range() {
    stillreel_cmd()
        .args(["render", "--audio", "track.mp3", "--image", "a.png", "--crf", "60"])
        .assert()
        .failure();
}

#[test]
fn test_render_with_unstartable_ffprobe_fails_cleanly() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let scratch_dir = tempdir()?;
    let audio = input_dir.path().join("track.mp3");
    let image = input_dir.path().join("a.png");
    std::fs::write(&audio, "dummy content")?;
    std::fs::write(&image, "dummy content")?;

    stillreel_cmd()
        .arg("render")
        .arg("--audio")
        .arg(&audio)
        .arg("--image")
        .arg(&image)
        .arg("--output-dir")
        .arg(output_dir.path())
        .arg("--temp-dir")
        .arg(scratch_dir.path())
        .args(["--ffmpeg", "/nonexistent/ffmpeg", "--ffprobe", "/nonexistent/ffprobe"])
        .assert()
        .code(1)
        .stderr(contains("Duration probe failed"));

    // Workspace removed, nothing written
    assert_eq!(std::fs::read_dir(scratch_dir.path())?.count(), 0);
    assert_eq!(std::fs::read_dir(output_dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_doctor_reports_missing_tools() {
    stillreel_cmd()
        .args(["doctor", "--ffmpeg", "/nonexistent/ffmpeg", "--ffprobe", "/nonexistent/ffprobe"])
        .assert()
        .failure()
        .stdout(contains("ffmpeg missing"))
        .stdout(contains("ffprobe missing"));
}

#[test]
fn test_doctor_json_output() -> Result<(), Box<dyn Error>> {
    let assert = stillreel_cmd()
        .args([
            "doctor",
            "--json",
            "--ffmpeg",
            "/nonexistent/ffmpeg",
            "--ffprobe",
            "/nonexistent/ffprobe",
        ])
        .assert()
        .failure();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let status: serde_json::Value = serde_json::from_str(stdout.trim())?;
    assert_eq!(status["ffmpeg"], false);
    assert_eq!(status["ffprobe"], false);
    Ok(())
}

#[test]
fn test_log_dir_receives_run_log() -> Result<(), Box<dyn Error>> {
    let log_dir = tempdir()?;

    stillreel_cmd()
        .args(["render", "--audio", "track.mp3"])
        .arg("--log-dir")
        .arg(log_dir.path())
        .assert()
        .code(2);

    let names: Vec<String> = std::fs::read_dir(log_dir.path())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("stillreel_run_"));
    Ok(())
}
