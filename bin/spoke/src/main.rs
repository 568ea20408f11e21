//! Spoke CLI - inspect and validate job checkpoint settings.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod options_file;

#[derive(Debug, Parser)]
#[command(name = "spoke")]
#[command(about = "Spoke streaming job tooling")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate checkpoint options from a YAML file
    Validate {
        /// Options file (flat `execution.checkpointing.*` keys or nested maps)
        file: PathBuf,

        /// Job name used in the output
        #[arg(long, default_value = "job")]
        name: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Print the default checkpoint configuration
    Defaults {
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Validate { file, name, format } => commands::validate::execute(&file, name, format),
        Command::Defaults { format } => commands::defaults::execute(format),
    }
}
