//! Rune Compose - translate Docker Compose files into container engine records
//!
//! This is the CLI entry point for Rune Compose.

use clap::Parser;
use rune_compose::compose::ComposeParser;
use rune_compose::error::{Result, RuneError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Rune Compose - Docker Compose file translator
#[derive(Parser)]
#[command(name = "rune-compose")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Translate a Docker Compose file into container engine records", long_about = None)]
struct Cli {
    /// Compose file (defaults to compose.yaml in the working directory)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the translated stack as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let compose_file = match cli.file {
        Some(file) => file,
        None => {
            let working_dir = std::env::current_dir().map_err(|source| RuneError::Read {
                path: PathBuf::from("."),
                source,
            })?;
            ComposeParser::find_compose_file(&working_dir)
                .ok_or(RuneError::NotFound(working_dir))?
        }
    };

    let stack = ComposeParser::load_file(&compose_file)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stack)?);
    } else {
        println!(
            "{}: {} services, {} networks, {} volumes",
            compose_file.display(),
            stack.service_names().count(),
            stack.network_names().count(),
            stack.volume_names().count()
        );
    }

    Ok(())
}
