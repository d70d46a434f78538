//! Scene resolution command handler.

use super::commands::OutputFormat;
use super::{read_text, to_json};
use picturebook::{
    Character, ResolutionStrategy, SceneMetadata, extract_scene_metadata, parse_roster_json,
    resolve_with_strategy,
};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ResolutionReport {
    characters: Vec<String>,
    strategy: Option<ResolutionStrategy>,
    metadata: Option<SceneMetadata>,
}

fn resolution_report(scene: &str, roster: &[Character]) -> ResolutionReport {
    let (resolved, strategy) = resolve_with_strategy(scene, roster);
    ResolutionReport {
        characters: resolved.iter().map(|c| c.name().clone()).collect(),
        strategy,
        metadata: extract_scene_metadata(scene),
    }
}

fn render(report: &ResolutionReport, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = String::new();
    match report.strategy {
        Some(strategy) => writeln!(out, "Resolved by: {}", strategy)?,
        None => writeln!(out, "No roster character found")?,
    }
    for name in &report.characters {
        writeln!(out, "- {}", name)?;
    }
    if let Some(clothing) = report.metadata.as_ref().and_then(|m| m.clothing) {
        writeln!(out, "Clothing: {}", clothing)?;
    }
    if let Some(metadata) = report.metadata.as_ref().filter(|m| !m.objects.is_empty()) {
        writeln!(out, "Objects: {}", metadata.objects.join(", "))?;
    }
    Ok(out)
}

/// Resolve one scene against a roster and print the result.
pub fn resolve_scene(
    scene_path: &Path,
    roster_path: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let scene = read_text(scene_path)?;
    let roster = parse_roster_json(&read_text(roster_path)?)?;
    print!("{}", render(&resolution_report(&scene, &roster), format)?);
    Ok(())
}
