//! Character name candidates pulled out of free text.
//!
//! The generating model lists characters in many shapes: bold bullets,
//! plain bullets, numbered lines, inline comma lists. These helpers turn
//! those shapes into cleaned, de-duplicated name candidates. Matching the
//! candidates against a roster happens in the resolver.

use crate::keywords::{Field, alternation, keywords, patterns};
use regex::Regex;
use std::sync::OnceLock;
use strum::IntoEnumIterator;

const MAX_NAME_WORDS: usize = 5;
const MAX_NAME_CHARS: usize = 50;

struct NamePatterns {
    bullet: Regex,
    bold_lead: Regex,
    plain_colon: Regex,
    plain_bullet: Regex,
    bare_name: Regex,
    bold: Regex,
    parenthetical: Regex,
    list_separator: Regex,
    main_characters: Regex,
}

fn name_patterns() -> &'static NamePatterns {
    static PATTERNS: OnceLock<NamePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| NamePatterns {
        bullet: Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+").expect("Valid bullet regex"),
        bold_lead: Regex::new(r"^\s*(?:(?:[-*•+]|\d+[.)])\s+)?\*\*(?P<name>[^*]+?)\*\*")
            .expect("Valid bold name regex"),
        plain_colon: Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+(?P<name>[^:*\n]{1,50}?)\s*[:：]")
            .expect("Valid plain name regex"),
        plain_bullet: Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+(?P<name>[^:*\n]{1,50}?)\s*$")
            .expect("Valid bullet name regex"),
        bare_name: Regex::new(r"^\s*(?P<name>\p{Lu}[\p{L} .'’-]{0,48}?)\s*[:：]?\s*$")
            .expect("Valid bare name regex"),
        bold: Regex::new(r"\*\*(?P<name>[^*]+?)\*\*").expect("Valid bold regex"),
        parenthetical: Regex::new(r"\([^)]*\)|\[[^\]]*\]").expect("Valid parenthetical regex"),
        list_separator: Regex::new(r"(?i)\s*(?:[,;&/]|\s(?:and|und|et)\s)\s*")
            .expect("Valid list separator regex"),
        main_characters: Regex::new(&format!(
            r"(?i)(?:{})\s*\**\s*[:：]\s*\**(?P<list>[^\n.]+)",
            alternation(keywords(Field::MainCharacters))
        ))
        .expect("Valid main characters regex"),
    })
}

/// Whether a candidate is really a field keyword rather than a name.
fn is_field_word(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    Field::iter().any(|field| {
        keywords(field)
            .iter()
            .any(|keyword| keyword.to_lowercase() == lower)
    })
}

/// Normalise a raw candidate into a name, or reject it.
pub(crate) fn clean_name(raw: &str) -> Option<String> {
    let p = name_patterns();
    let without_notes = p.parenthetical.replace_all(raw, " ");
    let trimmed = without_notes
        .split([':', '：'])
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '*' | '_' | '"' | '\'' | '“' | '”' | '„' | '«' | '»' | '-' | '#')
        });
    let name = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");

    if name.is_empty()
        || name.chars().count() > MAX_NAME_CHARS
        || name.split_whitespace().count() > MAX_NAME_WORDS
        || name.chars().any(|c| c.is_ascii_digit())
        || !name.chars().next().is_some_and(char::is_alphabetic)
        || is_field_word(&name)
    {
        return None;
    }
    Some(name)
}

/// Name carried by a single list line, if the line has a name shape.
///
/// Recognised shapes: `* **Mia:** ...`, `**Mia**`, `- Mia: ...`, `1. Mia`.
pub(crate) fn name_from_line(line: &str) -> Option<String> {
    let p = name_patterns();
    [&p.bold_lead, &p.plain_colon, &p.plain_bullet]
        .into_iter()
        .find_map(|regex| regex.captures(line))
        .and_then(|caps| caps.name("name"))
        .and_then(|m| clean_name(m.as_str()))
}

/// Split an inline list such as `Mia, Leo and Grandpa` into names.
pub(crate) fn split_name_list(list: &str) -> Vec<String> {
    let names = name_patterns()
        .list_separator
        .split(list)
        .filter_map(clean_name)
        .collect();
    dedupe(names)
}

/// Remove case-insensitive duplicates, keeping first occurrences.
pub(crate) fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    names
        .into_iter()
        .filter(|name| {
            let lower = name.to_lowercase();
            if seen.contains(&lower) {
                false
            } else {
                seen.push(lower);
                true
            }
        })
        .collect()
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn ends_section(line: &str) -> bool {
    let p = patterns();
    p.heading.is_match(line) || p.is_page_header(line) || p.delimiter.is_match(line)
}

/// Collect names from list lines following a section header.
///
/// Stops at a heading, page header, delimiter, or an unbulleted line that
/// carries no name. Lines indented deeper than the first name line are
/// treated as details of that entry and skipped.
fn scan_name_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    let bullet = &name_patterns().bullet;
    let mut names = Vec::new();
    let mut base_indent: Option<usize> = None;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if ends_section(line) {
            break;
        }
        if base_indent.is_some_and(|base| indent(line) > base) {
            continue;
        }
        match name_from_line(line) {
            Some(name) => {
                base_indent.get_or_insert(indent(line));
                names.push(name);
            }
            None if bullet.is_match(line) => continue,
            None => break,
        }
    }
    names
}

/// Names listed under a character section header (`Characters:`, `## Figuren`, ...).
pub(crate) fn character_section_names(text: &str) -> Vec<String> {
    section_names(text, Field::Characters)
}

/// Bold names inside a composition section.
///
/// Composition lines are usually zone labels (`Foreground: **Mia** builds a
/// snowman`), so only emphasised names count here.
pub(crate) fn composition_names(text: &str) -> Vec<String> {
    let p = patterns();
    let mut lines = text.lines().skip_while(|line| {
        !p.label(Field::Composition).is_match(line)
            && !p.heading_for(Field::Composition).is_match(line)
    });
    if lines.next().is_none() {
        return Vec::new();
    }

    let names = lines
        .take_while(|line| !ends_section(line))
        .flat_map(|line| name_patterns().bold.captures_iter(line))
        .filter_map(|caps| caps.name("name").and_then(|m| clean_name(m.as_str())))
        .filter(|name| !p.word(Field::CompositionZone).is_match(name))
        .collect();
    dedupe(names)
}

fn section_names(text: &str, field: Field) -> Vec<String> {
    let p = patterns();
    let lines: Vec<&str> = text.lines().collect();

    for (index, line) in lines.iter().enumerate() {
        let inline = if let Some(value) = p.label_value(field, line) {
            value
        } else if let Some(caps) = p.heading_for(field).captures(line) {
            caps.name("value").map_or("", |m| m.as_str())
        } else {
            continue;
        };

        let mut names = split_name_list(inline);
        names.extend(scan_name_lines(lines[index + 1..].iter().copied()));
        let names = dedupe(names);
        if !names.is_empty() {
            tracing::debug!(?field, count = names.len(), "Found names in section");
            return names;
        }
    }
    Vec::new()
}

/// Names from a `Main characters: A, B and C` phrase anywhere in the text.
pub(crate) fn main_character_names(text: &str) -> Vec<String> {
    name_patterns()
        .main_characters
        .captures_iter(text)
        .filter_map(|caps| caps.name("list"))
        .map(|list| split_name_list(list.as_str()))
        .find(|names| !names.is_empty())
        .unwrap_or_default()
}

/// Name lines immediately followed by an action/position/expression line.
///
/// ```text
/// **Mia**
/// Action: building a snowman
/// ```
pub(crate) fn cue_header_names(text: &str) -> Vec<String> {
    let p = patterns();
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let names = lines
        .windows(2)
        .filter(|pair| p.label(Field::CharacterCue).is_match(pair[1]))
        .filter_map(|pair| {
            let line = pair[0];
            name_from_line(line).or_else(|| {
                name_patterns()
                    .bare_name
                    .captures(line)
                    .and_then(|caps| caps.name("name"))
                    .and_then(|m| clean_name(m.as_str()))
            })
        })
        .collect();
    dedupe(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_strips_markup() {
        assert_eq!(clean_name("**Mia:**").as_deref(), Some("Mia"));
        assert_eq!(clean_name("\"Grandpa Joe\" (the narrator)").as_deref(), Some("Grandpa Joe"));
        assert_eq!(clean_name("Action"), None);
        assert_eq!(clean_name("Page 3"), None);
        assert_eq!(clean_name("a very long sentence that is surely not a name"), None);
    }

    #[test]
    fn test_name_line_shapes() {
        assert_eq!(name_from_line("* **Mia:** waves").as_deref(), Some("Mia"));
        assert_eq!(name_from_line("**Leo**").as_deref(), Some("Leo"));
        assert_eq!(name_from_line("- Grandpa: sits by the fire").as_deref(), Some("Grandpa"));
        assert_eq!(name_from_line("2. Luna").as_deref(), Some("Luna"));
        assert_eq!(name_from_line("Mia walks to school."), None);
    }

    #[test]
    fn test_split_name_list_languages() {
        assert_eq!(split_name_list("Mia, Leo and Grandpa"), vec!["Mia", "Leo", "Grandpa"]);
        assert_eq!(split_name_list("Mia und Leo"), vec!["Mia", "Leo"]);
        assert_eq!(split_name_list("Mia et Léo; mia"), vec!["Mia", "Léo"]);
    }

    #[test]
    fn test_section_skips_nested_details() {
        let text = "Characters:\n* **Mia:**\n  * Action: waving\n  * Expression: happy\n* **Leo:**\n\nSetting: a snowy park";
        assert_eq!(character_section_names(text), vec!["Mia", "Leo"]);
    }

    #[test]
    fn test_main_characters_phrase() {
        let text = "A quiet morning. Main characters: Mia and Leo. They smile.";
        assert_eq!(main_character_names(text), vec!["Mia", "Leo"]);
    }

    #[test]
    fn test_composition_bold_names() {
        let text = "Composition:\n- Foreground: **Mia** rolls a snowball\n- Background: **Leo** and **Grandpa**\n\n## Page 4";
        assert_eq!(composition_names(text), vec!["Mia", "Leo", "Grandpa"]);
    }

    #[test]
    fn test_cue_headers() {
        let text = "**Mia**\nAction: building a snowman\n\nLeo:\nPosition: behind the tree";
        assert_eq!(cue_header_names(text), vec!["Mia", "Leo"]);
    }
}
