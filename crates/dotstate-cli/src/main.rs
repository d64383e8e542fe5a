//! dotstate CLI
//!
//! The command-line interface for capturing and applying dotfile state.

mod cli;
mod commands;
mod config;
mod error;
mod prompt;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use dotstate_core::{AddOptions, Capture};

use cli::{Cli, Commands};
use config::{Config, Settings};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        println!("{} dotfile state manager", "dotstate".green().bold());
        println!();
        println!("Run {} for available commands.", "dotstate --help".cyan());
        return Ok(());
    };

    let config = Config::load(cli.config.as_deref())?;
    let settings = Settings::resolve(config, cli.source, cli.destination)?;
    tracing::debug!(
        source_dir = %settings.source_dir.display(),
        dest_dir = %settings.dest_dir.display(),
        "resolved settings"
    );
    execute_command(command, &settings, cli.verbose)
}

/// `DOTSTATE_LOG` takes precedence; otherwise warnings, or debug output with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("DOTSTATE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

fn execute_command(cmd: Commands, settings: &Settings, verbose: bool) -> Result<()> {
    match cmd {
        Commands::Add {
            recursive,
            prompt,
            empty,
            encrypt,
            exact,
            template,
            autotemplate,
            follow,
            paths,
        } => {
            let capture = Capture {
                recursive,
                prompt,
                follow: follow || settings.follow,
                options: AddOptions {
                    empty,
                    encrypt,
                    exact,
                    template,
                    auto_template: autotemplate,
                },
            };
            commands::run_add(settings, capture, &paths)
        }
        Commands::Apply { dry_run, targets } => {
            commands::run_apply(settings, &targets, dry_run, verbose)
        }
        Commands::Verify { targets } => commands::run_verify(settings, &targets),
        Commands::Dump {
            format,
            recursive,
            targets,
        } => commands::run_dump(settings, &targets, format, recursive),
        Commands::Archive { output } => commands::run_archive(settings, output.as_deref()),
        Commands::SourcePath { targets } => commands::run_source_path(settings, &targets),
    }
}
