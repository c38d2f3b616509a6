//! `doctor`: checks the external toolchain.

use crate::cli::DoctorArgs;
use crate::output;

use anyhow::{Result, bail};
use stillreel_core::{CoreConfigBuilder, check_toolchain};

pub fn run_doctor(args: DoctorArgs) -> Result<()> {
    let config = CoreConfigBuilder::new()
        .ffmpeg_path(args.tools.ffmpeg.clone())
        .ffprobe_path(args.tools.ffprobe.clone())
        .build();

    let status = check_toolchain(&config);

    if args.json {
        println!("{}", serde_json::to_string(&status)?);
    } else {
        output::print_heading("Toolchain");
        output::print_info("ffmpeg", config.ffmpeg_path.display());
        output::print_info("ffprobe", config.ffprobe_path.display());
        println!();
        output::print_toolchain_status(&status);
    }

    if !status.is_ready() {
        bail!("ffmpeg toolchain is incomplete");
    }
    if !args.json {
        output::print_success("Ready to render");
    }
    Ok(())
}
