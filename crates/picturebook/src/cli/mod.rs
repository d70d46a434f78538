//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the picturebook binary.

mod commands;
mod outline;
mod resolve;
mod styles;

pub use commands::{Cli, Commands};
pub use outline::{show_outline, show_requirements};
pub use resolve::resolve_scene;
pub use styles::list_styles;

use std::path::Path;

/// Read a UTF-8 input file.
fn read_text(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e).into())
}

/// Pretty JSON with a trailing newline.
fn to_json<T: serde::Serialize>(value: &T) -> Result<String, Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| picturebook::JsonError::new(e.to_string()))?;
    Ok(format!("{}\n", json))
}
