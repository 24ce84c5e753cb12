//! # Shoebox Agent
//!
//! Watches a drop folder and moves every photo that lands there into the
//! configured backup directories, named `YYYYMMDD_HHMMSS-<crc32>.<ext>`.

use std::process::ExitCode;

use clap::Parser;
use shoebox_agent::{Cli, Exit};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match shoebox_agent::run(cli).await {
        Exit::Completed => ExitCode::SUCCESS,
        Exit::Failed => ExitCode::FAILURE,
    }
}
