//! grpc-contract CLI - Go gRPC server and proto3 schema generator
//!
//! Commands:
//! - `grpc-contract generate` - Render every contract in a manifest
//! - `grpc-contract check` - Validate a manifest without rendering

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod generate;
mod logging;
mod manifest;
mod sink;

#[derive(Parser)]
#[command(name = "grpc-contract")]
#[command(author, version, about = "Generate Go gRPC contract servers and proto3 schemas", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is unset (overrides [generator].log_level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate server and schema files for every contract in a manifest
    Generate {
        /// Path to the manifest
        #[arg(short, long, default_value = manifest::DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Output directory (default: [generator].output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep generating remaining contracts after a failure
        #[arg(long)]
        keep_going: bool,
    },

    /// Validate a manifest without rendering anything
    Check {
        /// Path to the manifest
        #[arg(short, long, default_value = manifest::DEFAULT_MANIFEST)]
        manifest: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_level = cli.log_level.as_deref();

    match cli.command {
        Commands::Generate {
            manifest,
            output,
            keep_going,
        } => {
            generate::run(&manifest, output, keep_going, log_level)?;
        }
        Commands::Check { manifest } => {
            manifest::check(&manifest, log_level)?;
        }
    }

    Ok(())
}
