//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// scriv static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Source directory path (relative to project root)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Destination directory path (relative to project root)
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Config file name (default: scriv.toml)
    #[arg(short = 'C', long, default_value = "scriv.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile the site into the destination directory
    Compile {
        /// Keep running and recompile on source changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Compile and serve the site, recompiling on change
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port to serve on
        #[arg(short, long)]
        port: Option<u16>,
    },
}
