//! Matching scene text back to the story's character roster.

use crate::metadata::{extract_structured_metadata, strip_scene_metadata};
use crate::names::{character_section_names, cue_header_names, main_character_names};
use picturebook_core::Character;

/// Shortest name fragment allowed to match by substring.
const MIN_SUBSTRING_CHARS: usize = 3;

/// Which strategy produced a resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Names from the embedded JSON block
    StructuredBlock,
    /// Names listed under a character section header
    CharacterSection,
    /// Names from a "main characters:" phrase
    MainCharacters,
    /// Name lines followed by action/position/expression cues
    CueHeader,
    /// Roster names mentioned anywhere in the text
    NameMention,
}

/// Characters from `roster` present in a scene, in scene order.
///
/// # Examples
///
/// ```
/// use picturebook_core::{Character, ImageData};
/// use picturebook_narrative::resolve_characters_in_scene;
///
/// let photo = ImageData::new(vec![0xFF, 0xD8], "image/jpeg");
/// let roster = vec![
///     Character::new("Mia", photo.clone()),
///     Character::new("Leo", photo.clone()),
///     Character::new("Grandpa", photo),
/// ];
/// let scene = "Characters:\n* **Mia:** holding a lantern\n* **Leo:** pointing at the stars\n";
///
/// let names: Vec<&str> = resolve_characters_in_scene(scene, &roster)
///     .iter()
///     .map(|c| c.name().as_str())
///     .collect();
/// assert_eq!(names, vec!["Mia", "Leo"]);
/// ```
pub fn resolve_characters_in_scene<'a>(scene: &str, roster: &'a [Character]) -> Vec<&'a Character> {
    resolve_with_strategy(scene, roster).0
}

/// Resolve characters and report which strategy matched.
///
/// Strategies run in order until one yields at least one roster member.
#[tracing::instrument(skip_all, fields(scene_len = scene.len(), roster = roster.len()))]
pub fn resolve_with_strategy<'a>(
    scene: &str,
    roster: &'a [Character],
) -> (Vec<&'a Character>, Option<ResolutionStrategy>) {
    if roster.is_empty() {
        return (Vec::new(), None);
    }

    if let Some(metadata) = extract_structured_metadata(scene) {
        let matched = match_roster(&metadata.characters, roster);
        if !matched.is_empty() {
            tracing::debug!(count = matched.len(), "Resolved from structured block");
            return (matched, Some(ResolutionStrategy::StructuredBlock));
        }
    }

    let prose = strip_scene_metadata(scene);
    let text_strategies: [(ResolutionStrategy, fn(&str) -> Vec<String>); 3] = [
        (ResolutionStrategy::CharacterSection, character_section_names),
        (ResolutionStrategy::MainCharacters, main_character_names),
        (ResolutionStrategy::CueHeader, cue_header_names),
    ];
    for (strategy, extract) in text_strategies {
        let matched = match_roster(&extract(&prose), roster);
        if !matched.is_empty() {
            tracing::debug!(%strategy, count = matched.len(), "Resolved characters");
            return (matched, Some(strategy));
        }
    }

    let mentioned = mentioned_in(&prose, roster);
    if mentioned.is_empty() {
        tracing::debug!("No roster characters found in scene");
        (mentioned, None)
    } else {
        tracing::debug!(count = mentioned.len(), "Resolved from name mentions");
        (mentioned, Some(ResolutionStrategy::NameMention))
    }
}

/// Match candidate names to roster members, keeping candidate order.
fn match_roster<'a>(candidates: &[String], roster: &'a [Character]) -> Vec<&'a Character> {
    let mut matched: Vec<&'a Character> = Vec::new();
    for candidate in candidates {
        match match_candidate(candidate, roster) {
            Some(character) if !matched.iter().any(|m| std::ptr::eq(*m, character)) => {
                matched.push(character);
            }
            Some(_) => {}
            None => tracing::debug!(candidate = %candidate, "Name not in roster"),
        }
    }
    matched
}

/// Roster member for one candidate: exact name, then first name, then substring.
fn match_candidate<'a>(candidate: &str, roster: &'a [Character]) -> Option<&'a Character> {
    let wanted = candidate.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    let wanted_first = wanted.split_whitespace().next().unwrap_or_default();

    roster
        .iter()
        .find(|c| c.is_named(&wanted))
        .or_else(|| {
            roster.iter().find(|c| {
                let first = c.first_name().to_lowercase();
                first == wanted || first == wanted_first || c.name().to_lowercase() == wanted_first
            })
        })
        .or_else(|| {
            roster.iter().find(|c| {
                let name = c.name().to_lowercase();
                let (shorter, longer) = if name.chars().count() <= wanted.chars().count() {
                    (&name, &wanted)
                } else {
                    (&wanted, &name)
                };
                shorter.chars().count() >= MIN_SUBSTRING_CHARS && longer.contains(shorter.as_str())
            })
        })
}

/// Roster members whose full or first name appears anywhere in the text, in order of first mention.
///
/// Plain substring search, so inflected forms such as "Mias Hund" still count.
fn mentioned_in<'a>(text: &str, roster: &'a [Character]) -> Vec<&'a Character> {
    let haystack = text.to_lowercase();
    let mut found: Vec<(usize, &'a Character)> = roster
        .iter()
        .filter_map(|character| {
            let position = [character.name().as_str(), character.first_name()]
                .into_iter()
                .map(|name| name.trim().to_lowercase())
                .filter(|name| name.chars().count() >= MIN_SUBSTRING_CHARS)
                .find_map(|name| haystack.find(&name))?;
            Some((position, character))
        })
        .collect();
    found.sort_by_key(|(position, _)| *position);
    found.into_iter().map(|(_, character)| character).collect()
}
