//! Shoebox agent: the process around [`shoebox_core::BackupOrchestrator`].

pub mod app;
pub mod cli;
pub mod logging;

pub use app::{Exit, run};
pub use cli::Cli;
