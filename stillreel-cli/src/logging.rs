// ============================================================================
// stillreel-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console or Console + File
//
// Without a log directory the CLI uses env_logger, so RUST_LOG works as usual:
// - RUST_LOG=info (default): stage transitions and results
// - RUST_LOG=debug: every external tool invocation
//
// With a log directory, stillreel-core's log4rs setup writes the same records
// to stderr and to a timestamped run log.

use anyhow::{Context, Result};
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Name of the run log created in a log directory.
pub fn run_log_file_name() -> String {
    format!("stillreel_run_{}.log", get_timestamp())
}

/// Initializes logging and returns the run log path, if one was created.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match log_dir {
        Some(dir) => {
            let log_path = dir.join(run_log_file_name());
            stillreel_core::logging::setup_file_logging(&log_path, level)
                .with_context(|| format!("Failed to set up logging in {}", dir.display()))?;
            Ok(Some(log_path))
        }
        None => {
            let default_filter = if verbose { "debug" } else { "info" };
            // A second init (e.g. in tests) keeps the first logger
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(default_filter),
            )
            .try_init();
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_file_name() {
        let name = run_log_file_name();
        assert!(name.starts_with("stillreel_run_"));
        assert!(name.ends_with(".log"));
        // stillreel_run_ + YYYYMMDD_HHMMSS + .log
        assert_eq!(name.len(), "stillreel_run_".len() + 15 + ".log".len());
    }
}
