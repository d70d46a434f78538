//! Keys for the styled asset cache.

use crate::ClothingCategory;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Identifies one styled avatar: (character, clothing, art style).
///
/// Character names are lowercased so that "Mia" and "mia" share an entry.
///
/// # Examples
///
/// ```
/// use picturebook_core::{AvatarCacheKey, ClothingCategory};
///
/// let a = AvatarCacheKey::new("Mia", ClothingCategory::Winter, "pixar");
/// let b = AvatarCacheKey::new(" mia ", ClothingCategory::Winter, "pixar");
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "mia/winter/pixar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, derive_more::Display)]
#[display("{}/{}/{}", character, clothing, style)]
pub struct AvatarCacheKey {
    character: String,
    clothing: ClothingCategory,
    style: String,
}

impl AvatarCacheKey {
    /// Build a normalized key.
    pub fn new(character: &str, clothing: ClothingCategory, style: &str) -> Self {
        Self {
            character: character.trim().to_lowercase(),
            clothing,
            style: style.trim().to_string(),
        }
    }
}
