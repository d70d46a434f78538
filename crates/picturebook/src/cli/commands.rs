//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Picturebook - inspect outlines, character resolution and the style catalog
#[derive(Parser, Debug)]
#[command(name = "picturebook")]
#[command(about = "Inspect picture-book outlines, character resolution and the style catalog", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse an outline and show title, pages, clothing and covers
    Outline {
        /// Path to the outline text
        file: PathBuf,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Resolve the characters in one scene description
    Resolve {
        /// Path to the scene text
        scene: PathBuf,

        /// Path to the character roster JSON
        #[arg(long)]
        roster: PathBuf,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// List every (character, clothing) avatar a book needs
    Requirements {
        /// Path to the outline text
        outline: PathBuf,

        /// Path to the character roster JSON
        #[arg(long)]
        roster: PathBuf,

        /// JSON object of page number to full scene text, overriding outline hints
        #[arg(long)]
        scenes: Option<PathBuf>,

        /// Art style to show cache keys for
        #[arg(long)]
        style: Option<String>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Validate and list the style catalog
    Styles {
        /// Configuration file (defaults to bundled + user configuration)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
