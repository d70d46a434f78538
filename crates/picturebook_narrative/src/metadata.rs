//! Scene metadata: which characters, which clothing, which recurring objects.
//!
//! An embedded JSON block is authoritative when present. Text patterns are
//! only consulted when the block is missing, unparseable or names nobody.

use crate::extraction::{find_code_block, parse_json};
use crate::keywords::{Field, clothing_category, patterns};
use crate::names::{character_section_names, composition_names, main_character_names};
use picturebook_core::{ClothingCategory, SceneMetadata};
use serde::Deserialize;

/// How far past a clothing keyword a category token may appear.
const CLOTHING_LOOKAHEAD_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NamedEntry {
    Name(String),
    Object { name: String },
}

impl NamedEntry {
    fn into_name(self) -> String {
        match self {
            NamedEntry::Name(name) | NamedEntry::Object { name } => name.trim().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawSceneBlock {
    #[serde(default)]
    characters: Vec<NamedEntry>,
    #[serde(default)]
    clothing: Option<serde_json::Value>,
    #[serde(default)]
    objects: Vec<NamedEntry>,
}

impl RawSceneBlock {
    fn into_metadata(self) -> SceneMetadata {
        let names = |entries: Vec<NamedEntry>| {
            entries
                .into_iter()
                .map(NamedEntry::into_name)
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
        };
        let clothing = self
            .clothing
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(|value| clothing_category(value).or_else(|| patterns().find_clothing(value)));

        SceneMetadata {
            characters: names(self.characters),
            clothing,
            objects: names(self.objects),
        }
    }
}

/// Parse the embedded JSON block of a scene, if there is one.
///
/// Returns the block's data even when its character list is empty.
///
/// # Examples
///
/// ```
/// use picturebook_narrative::extract_structured_metadata;
/// use picturebook_core::ClothingCategory;
///
/// let scene = "Mia and Leo sled down the hill.\n\n```json\n{\"characters\": [\"Mia\", {\"name\": \"Leo\"}], \"clothing\": \"winter\", \"objects\": [\"red sled\"]}\n```";
/// let metadata = extract_structured_metadata(scene).unwrap();
/// assert_eq!(metadata.characters, vec!["Mia", "Leo"]);
/// assert_eq!(metadata.clothing, Some(ClothingCategory::Winter));
/// assert_eq!(metadata.objects, vec!["red sled"]);
/// ```
pub fn extract_structured_metadata(scene: &str) -> Option<SceneMetadata> {
    let block = find_code_block(scene)?;
    match parse_json::<RawSceneBlock>(block.content) {
        Ok(raw) => Some(raw.into_metadata()),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unparseable scene block");
            None
        }
    }
}

/// Extract scene metadata, falling back to text patterns.
///
/// Order: structured block with characters, character section, "main
/// characters" phrase, composition section. Returns `None` when no strategy
/// names anybody.
#[tracing::instrument(skip(scene), fields(scene_len = scene.len()))]
pub fn extract_scene_metadata(scene: &str) -> Option<SceneMetadata> {
    let structured = extract_structured_metadata(scene);
    if let Some(metadata) = structured.as_ref().filter(|m| m.has_characters()) {
        tracing::debug!(count = metadata.characters.len(), "Using structured scene block");
        return Some(metadata.clone());
    }

    let prose = strip_scene_metadata(scene);
    let characters = [
        character_section_names as fn(&str) -> Vec<String>,
        main_character_names,
        composition_names,
    ]
    .into_iter()
    .map(|strategy| strategy(&prose))
    .find(|names| !names.is_empty());

    let Some(characters) = characters else {
        tracing::debug!("No character names found in scene");
        return None;
    };

    Some(SceneMetadata {
        characters,
        clothing: parse_clothing_category(scene),
        objects: structured.map(|m| m.objects).unwrap_or_default(),
    })
}

/// Remove the embedded structured block, leaving the prose untouched.
///
/// The text before and after the block is rejoined with one blank line.
///
/// # Examples
///
/// ```
/// use picturebook_narrative::strip_scene_metadata;
///
/// let scene = "Mia waves.\n\n```json\n{\"characters\": [\"Mia\"]}\n```\n\nThe sun sets.";
/// assert_eq!(strip_scene_metadata(scene), "Mia waves.\n\nThe sun sets.");
/// assert_eq!(strip_scene_metadata("No block here."), "No block here.");
/// ```
pub fn strip_scene_metadata(scene: &str) -> String {
    let Some(block) = find_code_block(scene) else {
        return scene.to_string();
    };
    let before = scene[..block.start].trim_end();
    let after = scene[block.end..].trim_start();
    match (before.is_empty(), after.is_empty()) {
        (true, true) => String::new(),
        (false, true) => before.to_string(),
        (true, false) => after.to_string(),
        (false, false) => format!("{}\n\n{}", before, after),
    }
}

/// Clothing stated for a scene.
///
/// The structured block wins. Otherwise each clothing keyword is inspected and
/// a category token is searched on the same line, then the next line, then in
/// the following characters. A keyword with no valid value nearby is logged
/// and skipped.
///
/// # Examples
///
/// ```
/// use picturebook_narrative::parse_clothing_category;
/// use picturebook_core::ClothingCategory;
///
/// assert_eq!(parse_clothing_category("Kleidung:\nWinterkleidung"), Some(ClothingCategory::Winter));
/// assert_eq!(parse_clothing_category("A winter morning in the park."), None);
/// ```
pub fn parse_clothing_category(scene: &str) -> Option<ClothingCategory> {
    if let Some(clothing) = extract_structured_metadata(scene).and_then(|m| m.clothing) {
        return Some(clothing);
    }

    let p = patterns();
    let prose = strip_scene_metadata(scene);
    for keyword in p.word(Field::Clothing).find_iter(&prose) {
        let rest = &prose[keyword.end()..];
        let mut lines = rest.splitn(3, '\n');
        let same_line = lines.next().unwrap_or_default();
        let next_line = lines.next().unwrap_or_default();
        let window: String = rest.chars().take(CLOTHING_LOOKAHEAD_CHARS).collect();

        let found = [same_line, next_line, window.as_str()]
            .into_iter()
            .find_map(|candidate| p.find_clothing(candidate));
        match found {
            Some(category) => return Some(category),
            None => tracing::warn!(
                keyword = keyword.as_str(),
                "Clothing keyword without a recognised category nearby"
            ),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_without_characters_falls_through() {
        let scene = "Characters:\n* **Mia:** smiling\n\n```json\n{\"characters\": [], \"objects\": [\"kite\"]}\n```";
        let metadata = extract_scene_metadata(scene).unwrap();
        assert_eq!(metadata.characters, vec!["Mia"]);
        assert_eq!(metadata.objects, vec!["kite"]);
    }

    #[test]
    fn test_invalid_block_is_ignored() {
        let scene = "Main characters: Leo.\n```json\n{\"characters\": [\"Mia\"\n```";
        let metadata = extract_scene_metadata(scene).unwrap();
        assert_eq!(metadata.characters, vec!["Leo"]);
    }

    #[test]
    fn test_no_names_is_none() {
        assert!(extract_scene_metadata("The wind blows across the empty field.").is_none());
    }

    #[test]
    fn test_clothing_same_line_and_lookahead() {
        assert_eq!(
            parse_clothing_category("**Clothing:** formal outfits for the party"),
            Some(ClothingCategory::Formal)
        );
        assert_eq!(
            parse_clothing_category("Tenue : les enfants portent des vêtements d'été"),
            Some(ClothingCategory::Summer)
        );
        assert_eq!(parse_clothing_category("Clothing: pyjamas"), None);
    }

    #[test]
    fn test_block_clothing_wins() {
        let scene = "Clothing: summer\n```json\n{\"characters\": [\"Mia\"], \"clothing\": \"Winter\"}\n```";
        assert_eq!(parse_clothing_category(scene), Some(ClothingCategory::Winter));
    }
}
