//! Structured facts extracted from one scene description.

use crate::ClothingCategory;
use serde::{Deserialize, Serialize};

/// Characters, clothing and named objects present in a scene.
///
/// Derived on every call from the scene text; never persisted on its own.
///
/// # Examples
///
/// ```
/// use picturebook_core::{ClothingCategory, SceneMetadata};
///
/// let metadata = SceneMetadata {
///     characters: vec!["Mia".to_string(), "Leo".to_string()],
///     clothing: Some(ClothingCategory::Winter),
///     objects: vec!["red sled".to_string()],
/// };
/// assert!(metadata.has_characters());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneMetadata {
    /// Character names in order of appearance
    pub characters: Vec<String>,
    /// Clothing worn in this scene, when stated
    pub clothing: Option<ClothingCategory>,
    /// Recurring objects, places or animals referenced by name
    pub objects: Vec<String>,
}

impl SceneMetadata {
    /// Whether any character names were found.
    pub fn has_characters(&self) -> bool {
        !self.characters.is_empty()
    }
}
