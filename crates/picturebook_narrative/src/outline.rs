//! Outline parsing: title, page slices, scene hints, clothing plan, covers.

use crate::cover::{extract_cover_scenes, is_cover_marker};
use crate::keywords::{Field, clothing_category, patterns};
use picturebook_core::{ClothingCategory, ClothingPlan, CoverScenes, PageHeader};
use picturebook_error::{OutlineError, OutlineErrorKind, PicturebookResult};
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

/// Hints shorter than this are treated as not found.
const MIN_HINT_CHARS: usize = 10;
/// Minimum length of a free line used as a fallback hint.
const MIN_FALLBACK_LINE_CHARS: usize = 20;

/// Clothing value of a per-page directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageClothing {
    Set(ClothingCategory),
    Same,
}

/// Clothing facts read once from the outline, independent of the page count.
#[derive(Debug, Clone, Default)]
struct ClothingDirectives {
    primary: ClothingCategory,
    change_events: BTreeMap<u32, ClothingCategory>,
    per_page: BTreeMap<u32, PageClothing>,
}

/// The text belonging to one page: its header line and the lines after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice<'a> {
    /// Page number from the header
    pub page_number: u32,
    /// Header line remainder after the page number, markup trimmed
    pub header_rest: &'a str,
    /// Lines between this header and the next section
    pub lines: Vec<&'a str>,
}

impl PageSlice<'_> {
    /// Body lines joined back into text.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// A generated story outline with lazily parsed, cached views.
///
/// The text is immutable; every view is computed on first use and reused on
/// later calls. Parsing never fails: missing fields come back as `None` or
/// empty collections.
#[derive(Debug, Default)]
pub struct Outline {
    text: String,
    title: OnceLock<Option<String>>,
    headers: OnceLock<Vec<PageHeader>>,
    hints: OnceLock<BTreeMap<u32, String>>,
    covers: OnceLock<CoverScenes>,
    clothing: OnceLock<ClothingDirectives>,
}

impl Clone for Outline {
    fn clone(&self) -> Self {
        Self::new(self.text.clone())
    }
}

impl Outline {
    /// Wrap outline text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// The raw outline text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Book title.
    ///
    /// Tries, in order: a bold line after a heading, a `Title:` line after a
    /// heading, a plain line after a title heading, and a `Title:` line
    /// anywhere.
    pub fn extract_title(&self) -> Option<String> {
        self.title.get_or_init(|| self.find_title()).clone()
    }

    /// Page headers in source order.
    pub fn page_headers(&self) -> &[PageHeader] {
        self.headers.get_or_init(|| self.find_headers())
    }

    /// Number of distinct pages with a header.
    pub fn page_count(&self) -> u32 {
        self.page_headers()
            .iter()
            .map(|h| h.page_number)
            .collect::<HashSet<_>>()
            .len() as u32
    }

    /// Split the outline into per-page slices.
    ///
    /// Slices follow source order. When a page number repeats, the first
    /// header wins and later ones are skipped with a warning.
    pub fn page_slices(&self) -> Vec<PageSlice<'_>> {
        let p = patterns();
        let lines: Vec<&str> = self.text.lines().collect();
        let headers = self.page_headers();
        let mut seen = HashSet::new();
        let mut slices = Vec::with_capacity(headers.len());

        for (position, header) in headers.iter().enumerate() {
            if !seen.insert(header.page_number) {
                tracing::warn!(
                    page = header.page_number,
                    line = header.line_index,
                    "Duplicate page header, keeping the first"
                );
                continue;
            }
            let next = headers
                .get(position + 1)
                .map_or(lines.len(), |h| h.line_index);
            let body = lines[header.line_index + 1..next]
                .iter()
                .copied()
                .take_while(|line| !is_cover_marker(line) && !p.delimiter.is_match(line))
                .collect();
            slices.push(PageSlice {
                page_number: header.page_number,
                header_rest: header_rest(lines[header.line_index]),
                lines: body,
            });
        }
        slices
    }

    /// Check that page headers are unique and ascending.
    ///
    /// Parsing trusts source order; callers that want to reject inconsistent
    /// outlines call this first.
    ///
    /// # Errors
    ///
    /// Returns [`OutlineErrorKind::NoPages`], [`OutlineErrorKind::Duplicate`] or
    /// [`OutlineErrorKind::OutOfOrder`] for the first problem found.
    pub fn validate_page_order(&self) -> PicturebookResult<()> {
        let headers = self.page_headers();
        if headers.is_empty() {
            return Err(OutlineError::new(OutlineErrorKind::NoPages).into());
        }
        let mut seen = HashSet::new();
        let mut previous: Option<u32> = None;
        for header in headers {
            if !seen.insert(header.page_number) {
                return Err(OutlineError::new(OutlineErrorKind::Duplicate(header.page_number)).into());
            }
            if let Some(prev) = previous.filter(|prev| header.page_number < *prev) {
                return Err(OutlineError::new(OutlineErrorKind::OutOfOrder {
                    page: header.page_number,
                    previous: prev,
                    line_index: header.line_index,
                })
                .into());
            }
            previous = Some(header.page_number);
        }
        Ok(())
    }

    /// Short illustration hint per page.
    pub fn extract_scene_hints(&self) -> BTreeMap<u32, String> {
        self.hints.get_or_init(|| self.find_hints()).clone()
    }

    /// Title page, initial page and back cover scenes.
    pub fn extract_cover_scenes(&self) -> CoverScenes {
        self.covers
            .get_or_init(|| extract_cover_scenes(&self.text))
            .clone()
    }

    /// Clothing for pages `1..=total_pages`.
    ///
    /// Every page starts at the primary clothing (standard when none is
    /// declared). Change events switch every page from theirs onwards; a
    /// per-page directive overrides its own page, and `same` repeats the most
    /// recent explicit category.
    pub fn extract_clothing_map(&self, total_pages: u32) -> ClothingPlan {
        let directives = self.clothing.get_or_init(|| self.find_clothing());
        let mut plan = ClothingPlan::uniform(directives.primary, total_pages);
        let mut current = directives.primary;
        let mut last_explicit: Option<ClothingCategory> = None;

        for page in 1..=total_pages {
            if let Some(category) = directives.change_events.get(&page) {
                current = *category;
                last_explicit = Some(*category);
            }
            let value = match directives.per_page.get(&page) {
                Some(PageClothing::Set(category)) => {
                    last_explicit = Some(*category);
                    *category
                }
                Some(PageClothing::Same) => last_explicit.unwrap_or(current),
                None => current,
            };
            plan.per_page.insert(page, value);
        }
        plan
    }

    fn find_headers(&self) -> Vec<PageHeader> {
        let p = patterns();
        let mut headers = Vec::new();
        let mut previous: Option<u32> = None;

        for (line_index, line) in self.text.lines().enumerate() {
            if !p.is_page_header(line) {
                continue;
            }
            let Some(page_number) = p
                .page_header
                .captures(line)
                .and_then(|caps| caps.name("num"))
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|n| *n > 0)
            else {
                continue;
            };
            if previous.is_some_and(|prev| page_number <= prev) {
                tracing::warn!(page_number, previous, line_index, "Page headers are not ascending");
            }
            previous = Some(page_number);
            headers.push(PageHeader {
                page_number,
                line_index,
                raw_line: line.to_string(),
            });
        }
        tracing::debug!(count = headers.len(), "Found page headers");
        headers
    }

    /// Lines before the first page header, where front matter lives.
    fn front_matter(&self) -> Vec<&str> {
        let end = self
            .page_headers()
            .first()
            .map_or(usize::MAX, |h| h.line_index);
        self.text.lines().take(end).collect()
    }

    fn find_title(&self) -> Option<String> {
        let p = patterns();
        let front = self.front_matter();
        let headings: Vec<usize> = front
            .iter()
            .enumerate()
            .filter(|(_, line)| p.heading.is_match(line) && !is_cover_marker(line))
            .map(|(index, _)| index)
            .collect();
        let next_content = |index: usize| {
            front[index + 1..]
                .iter()
                .copied()
                .find(|line| !line.trim().is_empty())
        };

        let bold_after_heading = || {
            headings.iter().find_map(|&index| {
                next_content(index)
                    .filter(|line| is_bold_only(line) && !p.is_known_label(line))
                    .and_then(clean_title)
            })
        };
        let label_after_heading = || {
            headings.iter().find_map(|&index| {
                front[index..]
                    .iter()
                    .find_map(|line| p.label_value(Field::Title, line))
                    .and_then(clean_title)
            })
        };
        let plain_after_title_heading = || {
            headings
                .iter()
                .filter(|&&index| p.heading_for(Field::Title).is_match(front[index]))
                .find_map(|&index| {
                    next_content(index)
                        .filter(|line| !p.heading.is_match(line) && !p.is_known_label(line))
                        .and_then(clean_title)
                })
        };
        let plain_after_heading = || {
            headings.iter().find_map(|&index| {
                next_content(index)
                    .filter(|line| {
                        !p.heading.is_match(line)
                            && !p.delimiter.is_match(line)
                            && !p.is_known_label(line)
                            && !p.is_change_event(line)
                            && !is_cover_marker(line)
                    })
                    .and_then(clean_title)
            })
        };
        let label_anywhere = || {
            self.text
                .lines()
                .filter(|line| !is_cover_marker(line))
                .find_map(|line| p.label_value(Field::Title, line))
                .and_then(clean_title)
        };

        let title = bold_after_heading()
            .or_else(label_after_heading)
            .or_else(plain_after_title_heading)
            .or_else(plain_after_heading)
            .or_else(label_anywhere);
        if title.is_none() {
            tracing::debug!("No title found in outline");
        }
        title
    }

    fn find_hints(&self) -> BTreeMap<u32, String> {
        let p = patterns();
        let mut hints = BTreeMap::new();

        for slice in self.page_slices() {
            let labeled = || {
                slice.lines.iter().enumerate().find_map(|(index, line)| {
                    let value = p.label_value(Field::SceneHint, line)?;
                    if value.is_empty() {
                        slice.lines[index + 1..]
                            .iter()
                            .map(|l| l.trim())
                            .find(|l| !l.is_empty())
                            .filter(|l| !p.is_known_label(l))
                    } else {
                        Some(value)
                    }
                })
            };
            let inline = || p.label_value(Field::SceneHint, slice.header_rest);
            let first_long_line = || {
                slice
                    .lines
                    .iter()
                    .map(|line| strip_markup(line))
                    .find(|line| {
                        line.chars().count() >= MIN_FALLBACK_LINE_CHARS
                            && !p.is_known_label(line)
                            && !p.heading.is_match(line)
                    })
            };

            let hint = [labeled(), inline(), first_long_line()]
                .into_iter()
                .flatten()
                .map(strip_markup)
                .find(|hint| hint.chars().count() >= MIN_HINT_CHARS);
            match hint {
                Some(hint) => {
                    hints.insert(slice.page_number, hint.to_string());
                }
                None => tracing::debug!(page = slice.page_number, "No scene hint found"),
            }
        }
        hints
    }

    fn find_clothing(&self) -> ClothingDirectives {
        let p = patterns();
        let primary = self
            .text
            .lines()
            .find_map(|line| p.label_value(Field::PrimaryClothing, line))
            .and_then(|value| p.find_clothing(value))
            .unwrap_or_default();

        let mut change_events = BTreeMap::new();
        for caps in self.text.lines().filter_map(|line| p.change_event.captures(line)) {
            let page = caps.name("num").and_then(|m| m.as_str().parse::<u32>().ok());
            let category = caps.name("cat").and_then(|m| clothing_category(m.as_str()));
            match (page, category) {
                (Some(page), Some(category)) => {
                    change_events.entry(page).or_insert(category);
                }
                _ => tracing::debug!(line = &caps[0], "Ignoring clothing change without a valid category"),
            }
        }

        let mut per_page = BTreeMap::new();
        for slice in self.page_slices() {
            let value = std::iter::once(slice.header_rest)
                .chain(slice.lines.iter().copied())
                .find_map(|line| p.label_value(Field::Clothing, line));
            let Some(value) = value else { continue };
            if let Some(category) = p.find_clothing(value) {
                per_page.insert(slice.page_number, PageClothing::Set(category));
            } else if p.word(Field::Same).is_match(value) {
                per_page.insert(slice.page_number, PageClothing::Same);
            } else {
                tracing::debug!(page = slice.page_number, value, "Ignoring unknown clothing value");
            }
        }

        ClothingDirectives {
            primary,
            change_events,
            per_page,
        }
    }
}

/// Header line text after the page number, with separators and markup removed.
fn header_rest(line: &str) -> &str {
    patterns()
        .page_header
        .captures(line)
        .and_then(|caps| caps.name("rest"))
        .map_or("", |m| {
            m.as_str()
                .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '*' | '-' | '–' | '.'))
                .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '-' | '='))
        })
}

fn is_bold_only(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() > 4 && trimmed.starts_with("**") && trimmed.ends_with("**")
        && !trimmed[2..trimmed.len() - 2].contains("**")
}

fn strip_markup(line: &str) -> &str {
    line.trim()
        .trim_start_matches(['-', '*', '•', '>', '#'])
        .trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '_')
}

fn clean_title(raw: &str) -> Option<String> {
    let title = raw
        .trim()
        .trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '*' | '_' | '#' | '"' | '\'' | '“' | '”' | '„' | '«' | '»')
        })
        .trim_end_matches(':')
        .trim();
    (!title.is_empty()).then(|| title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_bold_after_heading() {
        let outline = Outline::new("# Story Outline\n\n**The Snow Fox**\n\n## Page 1\nScene: Mia in the snow garden.");
        assert_eq!(outline.extract_title().as_deref(), Some("The Snow Fox"));
    }

    #[test]
    fn test_title_plain_after_title_heading() {
        let outline = Outline::new("## Titel\n\"Mia und der Schneefuchs\"\n\n## Seite 1\nSzene: Mia im Garten.");
        assert_eq!(outline.extract_title().as_deref(), Some("Mia und der Schneefuchs"));
    }

    #[test]
    fn test_title_inline_anywhere() {
        let outline = Outline::new("Some intro text.\nTitre : Le Renard des Neiges\n");
        assert_eq!(outline.extract_title().as_deref(), Some("Le Renard des Neiges"));
    }

    #[test]
    fn test_title_page_heading_is_not_a_title() {
        let outline = Outline::new("## Title Page\nMia and Leo wave from a sled on a hill.\n");
        assert_eq!(outline.extract_title(), None);
    }

    #[test]
    fn test_header_rest_trims_separators() {
        assert_eq!(header_rest("## Page 3: Clothing: winter"), "Clothing: winter");
        assert_eq!(header_rest("**Page 4**"), "");
        assert_eq!(header_rest("--- Page 5 ---"), "");
    }

    #[test]
    fn test_hint_strategies() {
        let outline = Outline::new(
            "## Page 1\nScene: Mia opens the door to a white garden.\n\n## Page 2: Scene: Leo slips on the frozen pond.\nText: Oops!\n\n## Page 3\nText: Hi\nMia and Leo build a tall snowman together.\n\n## Page 4\nScene: Short\n",
        );
        let hints = outline.extract_scene_hints();
        assert_eq!(hints[&1], "Mia opens the door to a white garden.");
        assert_eq!(hints[&2], "Leo slips on the frozen pond.");
        assert_eq!(hints[&3], "Mia and Leo build a tall snowman together.");
        assert!(!hints.contains_key(&4));
    }

    #[test]
    fn test_slices_stop_at_cover_blocks() {
        let outline = Outline::new("## Page 1\nScene: Mia waves at the fox.\n---BACK COVER---\nThe fox sleeps under the stars.");
        let slices = outline.page_slices();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].lines, vec!["Scene: Mia waves at the fox."]);
    }

    #[test]
    fn test_cached_views_are_stable() {
        let outline = Outline::new("Title: Stable\n## Page 1\nClothing: summer\n");
        assert_eq!(outline.extract_title(), outline.extract_title());
        assert_eq!(outline.extract_clothing_map(1), outline.extract_clothing_map(1));
        assert_eq!(outline.page_count(), 1);
    }
}
