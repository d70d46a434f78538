//! Keyword registry: per-language keyword tables and the matchers built from them.
//!
//! Every pattern the parsers use is generated from the tables below. Supporting
//! a new language means adding rows to [`KEYWORDS`] and [`CLOTHING_TOKENS`];
//! no parsing code changes.

use picturebook_core::ClothingCategory;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use strum::IntoEnumIterator;

/// Languages the outline parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Language {
    /// English
    English,
    /// German
    German,
    /// French
    French,
}

/// Semantic fields that appear as labels or headers in model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Field {
    /// Book title
    Title,
    /// Page marker word ("Page 3")
    Page,
    /// Short illustration hint for a page
    SceneHint,
    /// Story text printed on a page
    PageText,
    /// Per-page or per-scene clothing
    Clothing,
    /// Story-wide default clothing
    PrimaryClothing,
    /// Section listing clothing change events
    ClothingChange,
    /// Character list section
    Characters,
    /// "Main characters: A, B" phrase
    MainCharacters,
    /// Scene setting sub-field
    Setting,
    /// Scene action sub-field
    Action,
    /// Scene mood sub-field
    Mood,
    /// Image composition section
    Composition,
    /// Front cover slot
    TitlePage,
    /// Page before the story starts
    InitialPage,
    /// Back cover slot
    BackCover,
    /// "Same as before" clothing value
    Same,
    /// Per-character action/position/expression line
    CharacterCue,
    /// Composition zones that are never character names
    CompositionZone,
}

struct KeywordRow {
    language: Language,
    field: Field,
    keywords: &'static [&'static str],
}

const fn row(
    language: Language,
    field: Field,
    keywords: &'static [&'static str],
) -> KeywordRow {
    KeywordRow {
        language,
        field,
        keywords,
    }
}

use Field as F;
use Language::{English as EN, French as FR, German as DE};

static KEYWORDS: &[KeywordRow] = &[
    row(EN, F::Title, &["Title", "Book Title", "Story Title"]),
    row(DE, F::Title, &["Titel", "Buchtitel"]),
    row(FR, F::Title, &["Titre", "Titre du livre"]),
    row(EN, F::Page, &["Page"]),
    row(DE, F::Page, &["Seite"]),
    row(FR, F::Page, &["Page"]),
    row(
        EN,
        F::SceneHint,
        &["Scene", "Scene Hint", "Scene Description", "Illustration", "Image", "Picture"],
    ),
    row(
        DE,
        F::SceneHint,
        &["Szene", "Szenenhinweis", "Szenenbeschreibung", "Illustration", "Bild"],
    ),
    row(
        FR,
        F::SceneHint,
        &["Scène", "Description de la scène", "Illustration", "Image"],
    ),
    row(EN, F::PageText, &["Text", "Story Text", "Page Text"]),
    row(DE, F::PageText, &["Text", "Seitentext", "Geschichte"]),
    row(FR, F::PageText, &["Texte", "Texte de la page"]),
    row(EN, F::Clothing, &["Clothing", "Outfit"]),
    row(DE, F::Clothing, &["Kleidung", "Outfit"]),
    row(FR, F::Clothing, &["Vêtements", "Tenue"]),
    row(
        EN,
        F::PrimaryClothing,
        &["Primary Clothing", "Main Clothing", "Default Clothing"],
    ),
    row(DE, F::PrimaryClothing, &["Hauptkleidung", "Standardkleidung"]),
    row(
        FR,
        F::PrimaryClothing,
        &["Tenue principale", "Vêtements principaux"],
    ),
    row(EN, F::ClothingChange, &["Clothing Changes", "Clothing Change"]),
    row(DE, F::ClothingChange, &["Kleidungswechsel"]),
    row(
        FR,
        F::ClothingChange,
        &["Changements de tenue", "Changement de tenue"],
    ),
    row(
        EN,
        F::Characters,
        &["Characters", "Characters in Scene", "Characters in this Scene"],
    ),
    row(
        DE,
        F::Characters,
        &["Figuren", "Charaktere", "Personen", "Figuren in der Szene"],
    ),
    row(FR, F::Characters, &["Personnages", "Personnages de la scène"]),
    row(EN, F::MainCharacters, &["Main Characters", "Main Character"]),
    row(
        DE,
        F::MainCharacters,
        &["Hauptfiguren", "Hauptpersonen", "Hauptcharaktere", "Hauptfigur"],
    ),
    row(
        FR,
        F::MainCharacters,
        &["Personnages principaux", "Personnage principal"],
    ),
    row(EN, F::Setting, &["Setting", "Location", "Background"]),
    row(DE, F::Setting, &["Schauplatz", "Ort", "Umgebung", "Hintergrund"]),
    row(FR, F::Setting, &["Décor", "Lieu", "Cadre"]),
    row(EN, F::Action, &["Action", "Activity"]),
    row(DE, F::Action, &["Handlung", "Aktion"]),
    row(FR, F::Action, &["Action"]),
    row(EN, F::Mood, &["Mood", "Atmosphere"]),
    row(DE, F::Mood, &["Stimmung", "Atmosphäre"]),
    row(FR, F::Mood, &["Ambiance", "Atmosphère", "Humeur"]),
    row(
        EN,
        F::Composition,
        &["Composition", "Image Composition", "Image Summary", "Layout"],
    ),
    row(DE, F::Composition, &["Komposition", "Bildkomposition", "Bildaufbau"]),
    row(FR, F::Composition, &["Composition", "Mise en page"]),
    row(EN, F::TitlePage, &["Title Page", "Front Cover", "Cover Scene"]),
    row(DE, F::TitlePage, &["Titelseite", "Titelbild", "Vorderseite"]),
    row(FR, F::TitlePage, &["Page de titre", "Couverture"]),
    row(
        EN,
        F::InitialPage,
        &["Initial Page", "Dedication Page", "Introduction Page"],
    ),
    row(DE, F::InitialPage, &["Einleitungsseite", "Widmungsseite"]),
    row(FR, F::InitialPage, &["Page initiale", "Page de dédicace"]),
    row(EN, F::BackCover, &["Back Cover"]),
    row(DE, F::BackCover, &["Rückseite", "Buchrückseite"]),
    row(FR, F::BackCover, &["Quatrième de couverture", "Dos de couverture"]),
    row(EN, F::Same, &["same", "same as before", "unchanged", "as before"]),
    row(DE, F::Same, &["gleich", "wie vorher", "unverändert", "dieselbe"]),
    row(FR, F::Same, &["pareil", "même", "identique", "inchangé", "comme avant"]),
    row(
        EN,
        F::CharacterCue,
        &["Action", "Position", "Expression", "Pose", "Emotion", "Doing"],
    ),
    row(
        DE,
        F::CharacterCue,
        &["Handlung", "Position", "Ausdruck", "Gesichtsausdruck", "Pose", "Haltung"],
    ),
    row(
        FR,
        F::CharacterCue,
        &["Action", "Position", "Expression", "Pose", "Posture"],
    ),
    row(
        EN,
        F::CompositionZone,
        &["Foreground", "Background", "Left", "Right", "Center", "Middle"],
    ),
    row(
        DE,
        F::CompositionZone,
        &["Vordergrund", "Hintergrund", "Links", "Rechts", "Mitte"],
    ),
    row(
        FR,
        F::CompositionZone,
        &["Premier plan", "Arrière-plan", "Gauche", "Droite", "Centre"],
    ),
];

static CLOTHING_TOKENS: &[(Language, ClothingCategory, &[&str])] = &[
    (EN, ClothingCategory::Winter, &["winter"]),
    (EN, ClothingCategory::Summer, &["summer"]),
    (EN, ClothingCategory::Formal, &["formal"]),
    (EN, ClothingCategory::Standard, &["standard"]),
    (DE, ClothingCategory::Winter, &["winter", "winterkleidung"]),
    (DE, ClothingCategory::Summer, &["sommer", "sommerkleidung"]),
    (DE, ClothingCategory::Formal, &["festlich", "formell"]),
    (DE, ClothingCategory::Standard, &["standard", "normal", "alltagskleidung"]),
    (FR, ClothingCategory::Winter, &["hiver"]),
    (FR, ClothingCategory::Summer, &["été"]),
    (
        FR,
        ClothingCategory::Formal,
        &["formel", "formelle", "habillé", "habillée"],
    ),
    (FR, ClothingCategory::Standard, &["standard", "normal", "normale"]),
];

/// Keywords for a field in one language.
pub fn keywords_for(language: Language, field: Field) -> &'static [&'static str] {
    KEYWORDS
        .iter()
        .find(|row| row.language == language && row.field == field)
        .map(|row| row.keywords)
        .unwrap_or(&[])
}

/// Keywords for a field across all languages, deduplicated case-insensitively.
pub fn keywords(field: Field) -> Vec<&'static str> {
    let mut seen = Vec::<String>::new();
    let mut result = Vec::new();
    for row in KEYWORDS.iter().filter(|row| row.field == field) {
        for keyword in row.keywords {
            let lower = keyword.to_lowercase();
            if !seen.contains(&lower) {
                seen.push(lower);
                result.push(*keyword);
            }
        }
    }
    result
}

/// Case-insensitive regex alternation for a set of keywords.
///
/// Longer keywords come first so "Scene Description" wins over "Scene", and
/// inner spaces match any run of whitespace.
pub fn alternation<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    let mut words: Vec<&str> = words.into_iter().collect();
    words.sort_by_key(|word| std::cmp::Reverse(word.chars().count()));
    words
        .iter()
        .map(|word| regex::escape(word).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}

/// Map a clothing token in any supported language to its category.
///
/// # Examples
///
/// ```
/// use picturebook_narrative::keywords::clothing_category;
/// use picturebook_core::ClothingCategory;
///
/// assert_eq!(clothing_category("Hiver"), Some(ClothingCategory::Winter));
/// assert_eq!(clothing_category("festlich"), Some(ClothingCategory::Formal));
/// assert_eq!(clothing_category("pyjamas"), None);
/// ```
pub fn clothing_category(token: &str) -> Option<ClothingCategory> {
    let cleaned = token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if cleaned.is_empty() {
        return None;
    }
    CLOTHING_TOKENS
        .iter()
        .find(|(_, _, tokens)| tokens.iter().any(|t| *t == cleaned))
        .map(|(_, category, _)| *category)
}

/// Compiled matchers built once from the keyword tables.
pub struct Patterns {
    labels: HashMap<Field, Regex>,
    headings: HashMap<Field, Regex>,
    words: HashMap<Field, Regex>,
    /// Page header line: heading, bold line or delimiter starting with a page keyword
    pub page_header: Regex,
    /// Clothing change event: `Page N: ... → category`
    pub change_event: Regex,
    /// Any clothing category token in any language
    pub clothing_token: Regex,
    /// Delimiter line such as `---TITLE PAGE---`
    pub delimiter: Regex,
    /// Any `Label:` at line start, known or not
    pub generic_label: Regex,
    /// Markdown heading
    pub heading: Regex,
}

impl Patterns {
    fn build() -> Self {
        let mut labels = HashMap::new();
        let mut headings = HashMap::new();
        let mut words = HashMap::new();
        for field in Field::iter() {
            let alt = alternation(keywords(field));
            labels.insert(field, label_regex(&alt));
            headings.insert(field, heading_regex(&alt));
            words.insert(field, word_regex(&alt));
        }

        let page = alternation(keywords(Field::Page));
        let page_header = Regex::new(&format!(
            r"(?i)^\s*(?:#{{1,6}}\s*\**|\*\*|[-=]{{3,}}\s*)\s*(?:{page})\s+(?P<num>\d+)\b\**(?P<rest>.*)$"
        ))
        .expect("Valid page header regex");
        let change_event = Regex::new(&format!(
            r"(?i)^\s*(?:[-*•+]\s*)?\**\s*(?:{page})\s+(?P<num>\d+)\s*\**\s*[:：]?(?P<body>.*?)(?:→|->|=>)\s*\**\s*(?P<cat>\p{{L}}+)"
        ))
        .expect("Valid change event regex");

        let tokens: Vec<&str> = CLOTHING_TOKENS
            .iter()
            .flat_map(|(_, _, tokens)| tokens.iter().copied())
            .collect();
        let clothing_token = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation(tokens)))
            .expect("Valid clothing token regex");

        Self {
            labels,
            headings,
            words,
            page_header,
            change_event,
            clothing_token,
            delimiter: Regex::new(r"^\s*(?:-{3,}|={3,})\s*(?P<name>[^-=\s][^-=]*?)\s*(?:-{3,}|={3,})\s*$")
                .expect("Valid delimiter regex"),
            generic_label: Regex::new(
                r"^\s*(?:[-*•+]\s*)?\**\s*(?P<label>\p{L}[\p{L} '’-]{0,40}?)\s*\**\s*[:：]",
            )
            .expect("Valid generic label regex"),
            heading: Regex::new(r"^\s*#{1,6}\s").expect("Valid heading regex"),
        }
    }

    /// `Label: value` line for a field; the value is captured as `value`.
    pub fn label(&self, field: Field) -> &Regex {
        &self.labels[&field]
    }

    /// Heading or bold-only line naming a field, with an optional trailing value.
    pub fn heading_for(&self, field: Field) -> &Regex {
        &self.headings[&field]
    }

    /// Any occurrence of a field keyword as a whole word.
    pub fn word(&self, field: Field) -> &Regex {
        &self.words[&field]
    }

    /// Value of a `Label: value` line for a field, if the line is one.
    pub fn label_value<'t>(&self, field: Field, line: &'t str) -> Option<&'t str> {
        self.label(field)
            .captures(line)
            .and_then(|caps| caps.name("value"))
            .map(|m| m.as_str())
    }

    /// Whether the line starts with a label of any known field.
    pub fn is_known_label(&self, line: &str) -> bool {
        self.labels.values().any(|regex| regex.is_match(line))
    }

    /// Whether the line is a page header.
    pub fn is_page_header(&self, line: &str) -> bool {
        self.page_header.is_match(line) && !self.is_change_event(line)
    }

    /// Whether the line is a clothing change event.
    pub fn is_change_event(&self, line: &str) -> bool {
        self.change_event.is_match(line)
    }

    /// First clothing category token in `text`.
    pub fn find_clothing(&self, text: &str) -> Option<ClothingCategory> {
        self.clothing_token
            .find_iter(text)
            .find_map(|m| clothing_category(m.as_str()))
    }
}

fn label_regex(alt: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)^\s*(?:[-*•+>]\s*|\d+[.)]\s*)?(?:#{{1,6}}\s*)?\**\s*(?:{alt})\s*\**\s*[:：]\s*\**\s*(?P<value>.*?)\s*\**\s*$"
    ))
    .expect("Valid label regex")
}

fn heading_regex(alt: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)^\s*(?:#{{1,6}}\s*\**|\*\*)\s*(?:{alt})\b\s*\**\s*[:：]?\s*\**\s*(?P<value>.*?)\s*\**\s*$"
    ))
    .expect("Valid heading regex")
}

fn word_regex(alt: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b(?:{alt})\b")).expect("Valid keyword regex")
}

/// Process-wide compiled patterns.
pub fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(Patterns::build)
}
