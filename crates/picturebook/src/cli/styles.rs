//! Style catalog command handler.

use super::commands::OutputFormat;
use super::to_json;
use picturebook::{AvatarSettings, PicturebookConfig, StyleLibrary};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct StyleReport {
    id: String,
    passthrough: bool,
    exemplar_bytes: Option<usize>,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct CatalogReport {
    avatar: AvatarSettings,
    styles: Vec<StyleReport>,
}

fn catalog_report(config: &PicturebookConfig) -> Result<CatalogReport, Box<dyn std::error::Error>> {
    let library = StyleLibrary::from_catalog(config)?;
    let styles = library
        .iter()
        .map(|style| StyleReport {
            id: style.id().clone(),
            passthrough: library.is_passthrough(style.id()),
            exemplar_bytes: style.exemplar().as_ref().map(|image| image.len()),
            prompt: style.prompt().clone(),
        })
        .collect();
    Ok(CatalogReport {
        avatar: config.avatar().clone(),
        styles,
    })
}

fn render(report: &CatalogReport, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let avatar = &report.avatar;
    let mut out = String::new();
    writeln!(
        out,
        "Attempts: {}, minimum scores: face {} / clothing {}, stored size: {}px",
        avatar.max_attempts(),
        avatar.min_face_score(),
        avatar.min_clothing_score(),
        avatar.max_dimension()
    )?;
    for style in &report.styles {
        let mut notes = Vec::new();
        if style.passthrough {
            notes.push("pass-through".to_string());
        }
        if let Some(bytes) = style.exemplar_bytes {
            notes.push(format!("exemplar {} bytes", bytes));
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        writeln!(out, "{}{}: {}", style.id, notes, style.prompt)?;
    }
    Ok(out)
}

/// Load, validate and list the style catalog.
pub fn list_styles(config_path: Option<&Path>, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => PicturebookConfig::from_file(path)?,
        None => PicturebookConfig::load()?,
    };
    let report = catalog_report(&config)?;
    info!(styles = report.styles.len(), "Style catalog valid");
    print!("{}", render(&report, format)?);
    Ok(())
}
