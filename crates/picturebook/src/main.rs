//! Picturebook CLI binary.
//!
//! This binary gives operators command-line access to the asset pipeline:
//! - Parse an outline and inspect pages, clothing and covers
//! - Resolve the characters of a scene against a roster
//! - List the avatars a book needs
//! - Validate the style catalog

use clap::Parser;
use picturebook::{LoggingConfig, init_logging};

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, list_styles, resolve_scene, show_outline, show_requirements};

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut logging = LoggingConfig::default().with_json_logs(cli.json_logs);
    if cli.verbose {
        logging = logging.with_log_level("debug");
    }
    init_logging(&logging)?;

    // Execute the requested command
    match cli.command {
        Commands::Outline { file, format } => show_outline(&file, format)?,

        Commands::Resolve {
            scene,
            roster,
            format,
        } => resolve_scene(&scene, &roster, format)?,

        Commands::Requirements {
            outline,
            roster,
            scenes,
            style,
            format,
        } => show_requirements(&outline, &roster, scenes.as_deref(), style.as_deref(), format)?,

        Commands::Styles { config, format } => list_styles(config.as_deref(), format)?,
    }

    Ok(())
}
