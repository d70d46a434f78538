//! Clothing categories tracked per page.

use serde::{Deserialize, Serialize};

/// The outfit state a character wears on a page.
///
/// The set is closed: any other token found in model output is ignored.
///
/// # Examples
///
/// ```
/// use picturebook_core::ClothingCategory;
///
/// assert_eq!(ClothingCategory::from_token("Winter"), Some(ClothingCategory::Winter));
/// assert_eq!(ClothingCategory::from_token("pyjamas"), None);
/// assert_eq!(ClothingCategory::default(), ClothingCategory::Standard);
/// assert_eq!(ClothingCategory::Formal.to_string(), "formal");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClothingCategory {
    /// Coats, hats, scarves
    Winter,
    /// Light clothes, swimwear
    Summer,
    /// Festive or dressed-up outfit
    Formal,
    /// Everyday outfit
    #[default]
    Standard,
}

impl ClothingCategory {
    /// Parse a canonical category token, tolerating case and surrounding punctuation.
    ///
    /// Localized synonyms are handled by the keyword registry, not here.
    pub fn from_token(token: &str) -> Option<Self> {
        let cleaned = token.trim_matches(|c: char| !c.is_alphanumeric());
        cleaned.parse().ok()
    }

    /// Lowercase identifier used in cache keys and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClothingCategory::Winter => "winter",
            ClothingCategory::Summer => "summer",
            ClothingCategory::Formal => "formal",
            ClothingCategory::Standard => "standard",
        }
    }
}
