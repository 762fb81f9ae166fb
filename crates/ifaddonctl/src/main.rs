//! ifaddonctl entry point.
//!
//! Initializes logging, loads addon metadata and runs the selected
//! subcommand.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ifaddonctl::output::{render_aliases, render_interfaces};
use ifaddonctl::{addon_name, load_addon, translate_file, Format};

const DEFAULT_INTERFACES: &str = "/etc/network/interfaces";

#[derive(Parser)]
#[command(name = "ifaddonctl")]
#[command(version, about = "Inspect ifupdown addon metadata and translate interfaces files", long_about = None)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite alias attributes of an interfaces file to canonical names
    Translate {
        /// Addon metadata (YAML, or JSON with a .json extension)
        #[arg(short, long)]
        metadata: PathBuf,
        #[arg(short, long, default_value = DEFAULT_INTERFACES)]
        interfaces: PathBuf,
        /// Addon name; defaults to the metadata file stem
        #[arg(long)]
        name: Option<String>,
        /// Fail on aliases claimed by more than one attribute
        #[arg(long)]
        strict: bool,
    },
    /// Print the alias table of an addon
    Aliases {
        #[arg(short, long)]
        metadata: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        strict: bool,
    },
}

/// Initialize tracing/logging. Logs go to stderr so stdout stays parseable.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let rendered = match cli.command {
        Commands::Translate {
            metadata,
            interfaces,
            name,
            strict,
        } => {
            let addon = load_addon(&metadata, name.as_deref(), strict)?;
            let ifaces = translate_file(&addon, &interfaces)?;
            render_interfaces(&ifaces, cli.format).context("Failed to render interfaces")?
        }
        Commands::Aliases {
            metadata,
            name,
            strict,
        } => {
            let addon = load_addon(&metadata, name.as_deref(), strict)?;
            render_aliases(
                &addon_name(&metadata, name.as_deref()),
                addon.alias_index(),
                cli.format,
            )
            .context("Failed to render aliases")?
        }
    };

    print!("{}", rendered);
    if cli.format == Format::Json {
        println!();
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("--- Starting ifaddonctl ---");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("ifaddonctl: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_translate_args() {
        let cli = Cli::try_parse_from([
            "ifaddonctl",
            "--format",
            "json",
            "translate",
            "--metadata",
            "bond.yaml",
            "--strict",
        ])
        .unwrap();

        assert_eq!(cli.format, Format::Json);
        match cli.command {
            Commands::Translate {
                metadata,
                interfaces,
                strict,
                ..
            } => {
                assert_eq!(metadata, PathBuf::from("bond.yaml"));
                assert_eq!(interfaces, PathBuf::from(DEFAULT_INTERFACES));
                assert!(strict);
            }
            Commands::Aliases { .. } => panic!("Expected translate"),
        }
    }
}
