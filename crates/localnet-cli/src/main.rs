//! Localnet CLI: turn a network builder's output into a runnable
//! docker-compose deployment.

use clap::{Args, Parser, Subcommand};
use localnet_config::{FailurePolicy, Subnet};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "localnet")]
#[command(about = "Generate a local multi-node network deployment", version)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = localnet_utils::logging::DEFAULT_LEVEL)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every node directory and the compose manifest
    Generate(RunArgs),
    /// Print the address, port and bootstrap assignment without writing anything
    Plan(RunArgs),
    /// Write the default generator configuration to a file
    DefaultConfig {
        /// Destination; the extension picks the format (.toml or .json)
        path: PathBuf,
    },
}

/// Inputs shared by `generate` and `plan`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Network file produced by the network builder
    #[arg(short, long, env = "LOCALNET_NETWORK_FILE")]
    pub network_file: PathBuf,

    /// Generator configuration file (.toml or .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory for node trees and the manifest
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Container image for every service
    #[arg(long)]
    pub image: Option<String>,

    /// Number of archive nodes to add after the validators
    #[arg(long = "num-archive-nodes")]
    pub archive_nodes: Option<usize>,

    /// Delete and regenerate an existing output directory
    #[arg(long = "override")]
    pub allow_override: bool,

    /// strict or lenient handling of per-node write failures
    #[arg(long)]
    pub failure_policy: Option<FailurePolicy>,

    /// Virtual network subnet, e.g. 10.0.7.0/24
    #[arg(long)]
    pub subnet: Option<Subnet>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    localnet_utils::init_logging_with_level(&cli.log_level);

    match cli.command {
        Commands::Generate(args) => commands::generate(&args),
        Commands::Plan(args) => commands::plan(&args),
        Commands::DefaultConfig { path } => commands::default_config(&path),
    }
}
