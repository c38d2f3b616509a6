//! Utility functions for formatting and output naming.

use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Generates `video_<unix seconds>_<6 alphanumerics>.mp4`.
///
/// The random suffix keeps two jobs finishing in the same second apart.
#[must_use]
pub fn generate_output_filename() -> String {
    let random_suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    format!(
        "video_{}_{}.mp4",
        chrono::Utc::now().timestamp(),
        random_suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(9.0), "00:00:09");
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_duration(-1.0), "??:??:??");
        assert_eq!(format_duration(f64::NAN), "??:??:??");
    }

    #[test]
    fn test_output_filename_shape() {
        let name = generate_output_filename();
        let stem = name.strip_suffix(".mp4").unwrap();
        let mut parts = stem.split('_');
        assert_eq!(parts.next(), Some("video"));
        assert!(parts.next().unwrap().parse::<i64>().unwrap() > 0);
        let suffix = parts.next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(parts.next(), None);
    }

    #[test]
    fn test_output_filenames_differ() {
        assert_ne!(generate_output_filename(), generate_output_filename());
    }
}
