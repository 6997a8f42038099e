// main.rs
mod cli;
mod config;
mod core;

use clap::Parser;
use cli::{Args, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Friend { command } => cli::handle_friend(command, &args.owner, args.data_dir),
        Commands::Interaction { command } => {
            cli::handle_interaction(command, &args.owner, args.data_dir)
        }
        Commands::Personality { command } => {
            cli::handle_personality(command, &args.owner, args.data_dir)
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
