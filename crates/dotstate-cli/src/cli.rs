//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// dotstate - Manage your dotfiles as a desired filesystem state
#[derive(Parser, Debug)]
#[command(name = "dotstate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: <config dir>/dotstate/dotstate.toml)
    #[arg(short, long, global = true, env = "DOTSTATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Source directory holding the desired state
    #[arg(short = 'S', long, global = true)]
    pub source: Option<PathBuf>,

    /// Destination directory the state is applied to
    #[arg(short = 'D', long, global = true)]
    pub destination: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for `dump`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Add destination files to the source state
    ///
    /// Examples:
    ///   dotstate add ~/.bashrc          # Add one file
    ///   dotstate add -r ~/.config/nvim  # Add a directory and everything in it
    ///   dotstate add -r -p ~/.config    # Ask before each path
    Add {
        /// Recurse into directories
        #[arg(short, long)]
        recursive: bool,

        /// Ask before adding each path
        #[arg(short, long)]
        prompt: bool,

        /// Add empty files
        #[arg(short, long)]
        empty: bool,

        /// Store file contents encrypted
        #[arg(long)]
        encrypt: bool,

        /// Mark directories exact
        #[arg(short = 'x', long)]
        exact: bool,

        /// Mark files as templates
        #[arg(short = 'T', long)]
        template: bool,

        /// Replace known data values with template variables
        #[arg(short, long)]
        autotemplate: bool,

        /// Add what symlinks point to instead of the links
        #[arg(long)]
        follow: bool,

        /// Destination paths to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Update the destination to match the source state
    Apply {
        /// Print what would change without changing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Destination paths to apply (default: everything)
        targets: Vec<PathBuf>,
    },

    /// Exit with an error if the destination differs from the source state
    Verify {
        /// Destination paths to verify (default: everything)
        targets: Vec<PathBuf>,
    },

    /// Print the resolved target state
    Dump {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Nest directory children
        #[arg(short, long)]
        recursive: bool,

        /// Destination paths to dump (default: everything)
        targets: Vec<PathBuf>,
    },

    /// Write the target state as a tar archive
    Archive {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the source path of targets, or the source directory
    SourcePath {
        /// Destination paths to look up
        targets: Vec<PathBuf>,
    },
}
