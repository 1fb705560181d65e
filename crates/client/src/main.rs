// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Blind, Id, Init, Match, SendRequest, SignRequest, Version, VersionCheck};

use blindauth_client::logging::init_logging;
use blindauth_client::state::AppState;

command_enum! {
    (Init, Init),
    (Id, Id),
    (Blind, Blind),
    (Match, Match),
    (Sign, SignRequest),
    (Send, SendRequest),
    (VersionCheck, VersionCheck),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Log to file as well when the config directory names a log dir
    let log_dir = AppState::load(args.config_path.clone())
        .ok()
        .and_then(|state| state.config.log_dir);
    let _guard = init_logging(args.log_level, log_dir.as_deref());

    let ctx = cli::op::OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
