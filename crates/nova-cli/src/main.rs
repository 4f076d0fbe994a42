//! Nova command-line driver
//!
//! Reads a lowered-AST JSON document, runs backend lowering, and reports
//! the generated module and any per-function failures.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nova_codegen::Linkage;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "nova")]
#[command(about = "Nova backend lowering driver", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower a document and print the generated module IR
    Build {
        /// Input lowered-AST JSON file
        file: PathBuf,
        /// Linkage given to generated functions
        #[arg(long, default_value = "export", value_parser = parse_linkage)]
        linkage: Linkage,
        /// Module name used in the rendered output
        #[arg(long, default_value = "nova")]
        module_name: String,
        /// Exit nonzero if any function fails to lower or verify
        #[arg(long)]
        strict: bool,
        /// Color output: auto, always, never
        #[arg(long, default_value = "auto")]
        color: String,
    },

    /// Lower a document and report failures without printing IR
    Check {
        /// Input lowered-AST JSON file
        file: PathBuf,
        /// Color output: auto, always, never
        #[arg(long, default_value = "auto")]
        color: String,
    },
}

fn parse_linkage(value: &str) -> Result<Linkage, String> {
    match value {
        "export" => Ok(Linkage::Export),
        "local" => Ok(Linkage::Local),
        "hidden" => Ok(Linkage::Hidden),
        "preemptible" => Ok(Linkage::Preemptible),
        other => Err(format!(
            "unknown linkage '{other}' (expected export, local, hidden, or preemptible)"
        )),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build { file, linkage, module_name, strict, color } => {
            commands::build::run(&file, linkage, module_name, strict, &color)
        }
        Commands::Check { file, color } => commands::check::run(&file, &color),
    }
}
