// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plinth command-line tool.
//!
//! Inspects the category catalog and checks configuration documents
//! against the built-in plugins.

mod catalog;
mod check;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Plinth - backend-agnostic category framework.
#[derive(Parser, Debug)]
#[command(name = "plinth", version, about, long_about = None)]
struct Cli {
    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load and validate configuration, then configure the built-in plugins.
    Check {
        /// Read this file (TOML, or JSON by extension) instead of the
        /// standard locations.
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// Print the category catalog.
    Catalog,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Check { config }) => check::run_check(config.as_deref(), cli.plain).await,
        Some(Commands::Catalog) => {
            catalog::print_catalog(&plinth::CategoryCatalog::standard(), cli.plain);
            ExitCode::SUCCESS
        }
        None => {
            println!("plinth: use --help for available commands");
            ExitCode::SUCCESS
        }
    }
}

/// Initializes the tracing subscriber.
///
/// `PLINTH_LOG` takes precedence over `RUST_LOG`; without either, Plinth
/// crates log at `info` and everything else at `warn`.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("PLINTH_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("plinth=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn check_accepts_config_path() {
        let cli = Cli::try_parse_from(["plinth", "--plain", "check", "--config", "a.json"]).unwrap();
        assert!(cli.plain);
        assert!(matches!(
            cli.command,
            Some(Commands::Check { config: Some(ref p) }) if p == &PathBuf::from("a.json")
        ));
    }
}
