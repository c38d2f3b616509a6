// stillreel-cli/src/main.rs
//
// Entry point for the `stillreel` binary: parses arguments, sets up logging,
// dispatches to the command and turns a failure into a classified message and
// a non-zero exit code (2 for bad input, 1 otherwise).

use clap::Parser;
use std::process;
use stillreel_cli::logging::init_logging;
use stillreel_cli::{Cli, Commands, output, run_doctor, run_render};

fn main() {
    let cli = Cli::parse();

    match init_logging(cli.verbose, cli.log_dir.as_deref()) {
        Ok(Some(log_path)) => log::debug!("Writing run log to {}", log_path.display()),
        Ok(None) => {}
        Err(e) => {
            output::print_error(&e);
            process::exit(1);
        }
    }

    let result = match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Doctor(args) => run_doctor(args),
    };

    if let Err(e) = result {
        output::print_error(&e);
        process::exit(output::exit_code(&e));
    }
}
