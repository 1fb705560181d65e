pub use clap::Parser;

use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "blindauth")]
#[command(about = "Blinded identities and signed requests for community servers")]
pub struct Args {
    /// Path to the config directory (defaults to ~/.blindauth)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: crate::Command,
}
