//! Outline and requirement command handlers.

use super::commands::OutputFormat;
use super::{read_text, to_json};
use picturebook::{
    AssetRequirements, ClothingCategory, CoverScenes, Outline, collect_asset_requirements,
    parse_roster_json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;
use tracing::{info, warn};

/// One page of an outline report.
#[derive(Debug, Serialize)]
struct PageReport {
    page: u32,
    clothing: ClothingCategory,
    scene: Option<String>,
}

/// Everything the parser found in an outline.
#[derive(Debug, Serialize)]
struct OutlineReport {
    title: Option<String>,
    page_count: u32,
    primary_clothing: ClothingCategory,
    pages: Vec<PageReport>,
    covers: CoverScenes,
    page_order_problem: Option<String>,
}

fn outline_report(outline: &Outline) -> OutlineReport {
    let page_count = outline.page_count();
    let plan = outline.extract_clothing_map(page_count);
    let mut hints = outline.extract_scene_hints();

    let page_order_problem = outline.validate_page_order().err().map(|e| {
        warn!(error = %e, "Outline pages are not in order");
        e.to_string()
    });

    let pages = plan
        .per_page
        .iter()
        .map(|(page, clothing)| PageReport {
            page: *page,
            clothing: *clothing,
            scene: hints.remove(page),
        })
        .collect();

    OutlineReport {
        title: outline.extract_title(),
        page_count,
        primary_clothing: plan.primary,
        pages,
        covers: outline.extract_cover_scenes(),
        page_order_problem,
    }
}

fn render_outline(report: &OutlineReport, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = String::new();
    writeln!(out, "Title: {}", report.title.as_deref().unwrap_or("(none)"))?;
    writeln!(out, "Pages: {}", report.page_count)?;
    writeln!(out, "Primary clothing: {}", report.primary_clothing)?;
    if let Some(problem) = &report.page_order_problem {
        writeln!(out, "Warning: {}", problem)?;
    }
    writeln!(out)?;
    for page in &report.pages {
        writeln!(
            out,
            "Page {} [{}]: {}",
            page.page,
            page.clothing,
            page.scene.as_deref().unwrap_or("(no scene)")
        )?;
    }
    writeln!(out)?;
    for (slot, cover) in report.covers.iter() {
        let clothing = cover
            .clothing
            .map(|c| format!(" [{}]", c))
            .unwrap_or_default();
        let scene = if cover.is_empty() {
            "(none)".to_string()
        } else {
            cover.scene.replace('\n', " / ")
        };
        writeln!(out, "{}{}: {}", slot, clothing, scene)?;
    }
    Ok(out)
}

/// Parse an outline file and print what was found.
pub fn show_outline(path: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let outline = Outline::new(read_text(path)?);
    let report = outline_report(&outline);
    info!(pages = report.page_count, "Parsed outline");
    print!("{}", render_outline(&report, format)?);
    Ok(())
}

/// One requirement line of a requirements report.
#[derive(Debug, Serialize)]
struct RequirementReport {
    character: String,
    clothing: ClothingCategory,
    slots: Vec<String>,
    cache_key: Option<String>,
}

fn requirement_reports(requirements: &AssetRequirements, style: Option<&str>) -> Vec<RequirementReport> {
    requirements
        .iter()
        .map(|(requirement, slots)| RequirementReport {
            character: requirement.character.clone(),
            clothing: requirement.clothing,
            slots: slots.iter().map(ToString::to_string).collect(),
            cache_key: style.map(|style| requirement.cache_key(style).to_string()),
        })
        .collect()
}

fn render_requirements(
    reports: &[RequirementReport],
    format: OutputFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    if format == OutputFormat::Json {
        return to_json(&reports);
    }

    let mut out = String::new();
    for report in reports {
        write!(out, "{} ({}): {}", report.character, report.clothing, report.slots.join(", "))?;
        if let Some(key) = &report.cache_key {
            write!(out, "  -> {}", key)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{} avatars required", reports.len())?;
    Ok(out)
}

/// Collect the avatars a book needs and print them.
pub fn show_requirements(
    outline_path: &Path,
    roster_path: &Path,
    scenes_path: Option<&Path>,
    style: Option<&str>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let outline = Outline::new(read_text(outline_path)?);
    let roster = parse_roster_json(&read_text(roster_path)?)?;

    let mut scenes = outline.extract_scene_hints();
    if let Some(path) = scenes_path {
        let text = read_text(path)?;
        let full: BTreeMap<u32, String> =
            serde_json::from_str(&text).map_err(|e| picturebook::JsonError::parse(e, &text))?;
        scenes.extend(full);
    }

    let requirements = collect_asset_requirements(
        &scenes,
        &outline.extract_clothing_map(outline.page_count()),
        &outline.extract_cover_scenes(),
        &roster,
    );
    print!(
        "{}",
        render_requirements(&requirement_reports(&requirements, style), format)?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use picturebook::{Character, ImageData};

    const OUTLINE: &str = "# Outline\nTitle: The Lantern Walk\n\nPrimary Clothing: winter\n\n## Page 1\nScene: Mia and Leo fold paper lanterns at the table.\n\n## Page 2\nScene: Mia walks through the snowy park alone.\n";

    #[test]
    fn test_outline_report_human() {
        let report = outline_report(&Outline::new(OUTLINE));
        let text = render_outline(&report, OutputFormat::Human).unwrap();

        assert!(text.contains("Title: The Lantern Walk"));
        assert!(text.contains("Pages: 2"));
        assert!(text.contains("Page 2 [winter]: Mia walks through the snowy park alone."));
        assert!(text.contains("title_page: (none)"));
        assert!(report.page_order_problem.is_none());
    }

    #[test]
    fn test_outline_report_json() {
        let report = outline_report(&Outline::new(OUTLINE));
        let json: serde_json::Value =
            serde_json::from_str(&render_outline(&report, OutputFormat::Json).unwrap()).unwrap();

        assert_eq!(json["title"], "The Lantern Walk");
        assert_eq!(json["pages"][0]["page"], 1);
        assert_eq!(json["pages"][0]["clothing"], "winter");
    }

    #[test]
    fn test_requirements_with_cache_keys() {
        let outline = Outline::new(OUTLINE);
        let photo = ImageData::new(vec![1; 4], "image/png");
        let roster = vec![Character::new("Mia", photo.clone()), Character::new("Leo", photo)];
        let requirements = collect_asset_requirements(
            &outline.extract_scene_hints(),
            &outline.extract_clothing_map(outline.page_count()),
            &outline.extract_cover_scenes(),
            &roster,
        );

        let reports = requirement_reports(&requirements, Some("pixar"));
        let text = render_requirements(&reports, OutputFormat::Human).unwrap();

        assert!(text.contains("Mia (winter): page 1, page 2"));
        assert!(text.contains("-> mia/winter/pixar"));
        assert!(text.ends_with("2 avatars required\n"));
    }
}
