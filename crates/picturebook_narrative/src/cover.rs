//! Cover scene extraction for both outline dialects.

use crate::keywords::{Field, patterns};
use picturebook_core::{CoverScene, CoverScenes, CoverSlot};
use strum::IntoEnumIterator;

/// Minimum length of a free line used as a cover scene.
const MIN_SCENE_LINE_CHARS: usize = 20;

/// Sub-fields of a delimiter block, in the order they are concatenated.
const SCENE_PARTS: [(Field, &str); 4] = [
    (Field::Setting, "Setting"),
    (Field::Characters, "Characters"),
    (Field::Action, "Action"),
    (Field::Mood, "Mood"),
];

fn slot_field(slot: CoverSlot) -> Field {
    match slot {
        CoverSlot::TitlePage => Field::TitlePage,
        CoverSlot::InitialPage => Field::InitialPage,
        CoverSlot::BackCover => Field::BackCover,
    }
}

/// Slot named by a delimiter or heading text.
///
/// The back cover is checked first because some languages build its name
/// from the front cover's ("Quatrième de couverture").
fn slot_named(name: &str) -> Option<CoverSlot> {
    let p = patterns();
    [CoverSlot::BackCover, CoverSlot::InitialPage, CoverSlot::TitlePage]
        .into_iter()
        .find(|slot| p.word(slot_field(*slot)).is_match(name))
}

/// Whether a line opens a cover section in either dialect.
pub(crate) fn is_cover_marker(line: &str) -> bool {
    let p = patterns();
    if let Some(caps) = p.delimiter.captures(line) {
        return caps.name("name").is_some_and(|m| slot_named(m.as_str()).is_some());
    }
    CoverSlot::iter().any(|slot| {
        let field = slot_field(slot);
        p.heading_for(field).is_match(line) || p.label(field).is_match(line)
    })
}

/// Extract all three cover scenes, preferring whichever dialect yields text.
pub(crate) fn extract_cover_scenes(text: &str) -> CoverScenes {
    let lines: Vec<&str> = text.lines().collect();
    let delimited = delimiter_dialect(&lines);
    let mut covers = CoverScenes::default();

    for slot in CoverSlot::iter() {
        let from_blocks = delimited.get(slot);
        let scene = if from_blocks.is_empty() {
            labeled_dialect(&lines, slot)
        } else {
            from_blocks.clone()
        };
        if scene.is_empty() {
            tracing::debug!(%slot, "No cover scene found");
        }
        *covers.get_mut(slot) = scene;
    }
    covers
}

fn delimiter_dialect(lines: &[&str]) -> CoverScenes {
    let p = patterns();
    let mut covers = CoverScenes::default();

    for (index, line) in lines.iter().enumerate() {
        let Some(slot) = p
            .delimiter
            .captures(line)
            .and_then(|caps| caps.name("name"))
            .and_then(|m| slot_named(m.as_str()))
        else {
            continue;
        };
        if !covers.get(slot).is_empty() {
            continue;
        }
        let block: Vec<&str> = lines[index + 1..]
            .iter()
            .copied()
            .take_while(|l| !p.delimiter.is_match(l) && !p.is_page_header(l))
            .collect();
        *covers.get_mut(slot) = scene_from_block(&block);
    }
    covers
}

fn scene_from_block(block: &[&str]) -> CoverScene {
    let p = patterns();
    let parts: Vec<String> = SCENE_PARTS
        .iter()
        .filter_map(|(field, label)| {
            block
                .iter()
                .find_map(|line| p.label_value(*field, line))
                .filter(|value| !value.is_empty())
                .map(|value| format!("{}: {}", label, value))
        })
        .collect();

    let scene = if parts.is_empty() {
        block
            .iter()
            .map(|line| line.trim())
            .find(|line| {
                line.chars().count() >= MIN_SCENE_LINE_CHARS
                    && !p.is_known_label(line)
                    && !p.generic_label.is_match(line)
            })
            .unwrap_or_default()
            .to_string()
    } else {
        parts.join("\n")
    };

    CoverScene {
        scene,
        clothing: block_clothing(block),
    }
}

fn block_clothing(block: &[&str]) -> Option<picturebook_core::ClothingCategory> {
    let p = patterns();
    block
        .iter()
        .find_map(|line| p.label_value(Field::Clothing, line))
        .and_then(|value| p.find_clothing(value))
}

fn labeled_dialect(lines: &[&str], slot: CoverSlot) -> CoverScene {
    let p = patterns();
    let field = slot_field(slot);

    for (index, line) in lines.iter().enumerate() {
        let inline = if let Some(value) = p.label_value(field, line) {
            value
        } else if let Some(caps) = p.heading_for(field).captures(line) {
            caps.name("value").map_or("", |m| m.as_str())
        } else {
            continue;
        };

        let following: Vec<&str> = lines[index + 1..]
            .iter()
            .copied()
            .take_while(|l| !l.trim().is_empty() && !is_cover_marker(l) && !p.heading.is_match(l))
            .collect();

        let mut parts = Vec::new();
        if !inline.trim().is_empty() {
            parts.push(inline.trim().to_string());
        }
        parts.extend(
            following
                .iter()
                .take_while(|l| !p.is_known_label(l))
                .map(|l| l.trim().to_string()),
        );

        let scene = CoverScene {
            scene: parts.join(" "),
            clothing: block_clothing(&following),
        };
        if !scene.is_empty() {
            return scene;
        }
    }
    CoverScene::default()
}
