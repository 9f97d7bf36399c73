//! CLI parse: clap types for Scrivener. No behavior; definitions only.

use crate::types::ProjectId;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Scrivener CLI - resumable chapter-by-chapter novel generation
#[derive(Parser)]
#[command(name = "scrivener")]
#[command(about = "Generate a novel chapter by chapter, picking the best of several drafts each time")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (looked up for config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Extra configuration file, layered above the workspace files
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a project and generate it, printing progress as it goes
    Start {
        /// Work title
        #[arg(long)]
        title: String,
        /// Number of chapters to generate (1-100)
        #[arg(long)]
        chapters: u32,
        /// Model id (defaults to provider.model from config)
        #[arg(long)]
        model: Option<String>,
        /// API key (defaults to provider.api_key from config)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Continue a stalled project from its last saved chapter
    Resume {
        id: ProjectId,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// List projects, newest first
    List {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show a project's progress and document
    Show {
        id: ProjectId,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Follow a project's progress until it completes or fails
    Watch { id: ProjectId },
}
