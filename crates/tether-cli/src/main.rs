//! Tether host CLI
//!
//! Runs a bridge host over stdin/stdout, sends one-shot requests, lists the
//! registered native types and validates config files.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tether_cli::commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Dynamic call-resolution bridge host", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON-lines requests on stdin, answering on stdout
    Serve {
        /// Config file (tether.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Send a single request and print the response
    Call {
        /// Operation name (invoke, keep, invokeAndCache, dispose)
        method: String,
        /// Operation arguments as JSON
        args_json: Option<String>,
        /// Config file (tether.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List registered native types and their members
    Types,

    /// Validate a config file
    CheckConfig {
        /// Path to the config file
        path: PathBuf,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Serve { config } => commands::serve::execute(config.as_deref()),
        Commands::Call {
            method,
            args_json,
            config,
        } => commands::call::execute(method, args_json, config.as_deref()),
        Commands::Types => commands::types::execute(),
        Commands::CheckConfig { path } => commands::check_config::execute(&path),
    }
}
