//! Story characters as seen by the asset pipeline.

use crate::{ClothingCategory, ImageData};
use derive_getters::Getters;
use std::collections::HashMap;

/// A character taking part in one story-generation job.
///
/// The pipeline never changes a character's identity; it only reads the
/// reference images and records freshly styled variants for reuse within the job.
///
/// # Examples
///
/// ```
/// use picturebook_core::{Character, ClothingCategory, ImageData};
///
/// let photo = ImageData::new(vec![1, 2, 3], "image/jpeg");
/// let coat = ImageData::new(vec![4, 5, 6], "image/jpeg");
/// let mia = Character::new("Mia Sommer", photo.clone())
///     .with_clothing_variant(ClothingCategory::Winter, coat.clone());
///
/// assert_eq!(mia.first_name(), "Mia");
/// assert!(mia.source_image(ClothingCategory::Winter).ptr_eq(&coat));
/// assert!(mia.source_image(ClothingCategory::Summer).ptr_eq(&photo));
/// ```
#[derive(Debug, Clone, Getters)]
pub struct Character {
    /// Display name, unique within a story
    name: String,
    /// Body reference image used when no clothing variant exists
    reference_image: ImageData,
    /// Face photo used for identity checks, if distinct from the body reference
    identity_image: Option<ImageData>,
    /// Body reference images per clothing category
    clothing_variants: HashMap<ClothingCategory, ImageData>,
    /// Textual outfit descriptions per clothing category
    clothing_descriptions: HashMap<ClothingCategory, String>,
    /// Styled renders keyed by (art style, clothing)
    styled_variants: HashMap<(String, ClothingCategory), ImageData>,
}

impl Character {
    /// Create a character with a single reference image.
    pub fn new(name: impl Into<String>, reference_image: ImageData) -> Self {
        Self {
            name: name.into().trim().to_string(),
            reference_image,
            identity_image: None,
            clothing_variants: HashMap::new(),
            clothing_descriptions: HashMap::new(),
            styled_variants: HashMap::new(),
        }
    }

    /// Attach a face photo for identity checks.
    pub fn with_identity_image(mut self, image: ImageData) -> Self {
        self.identity_image = Some(image);
        self
    }

    /// Attach a body reference image for a clothing category.
    pub fn with_clothing_variant(mut self, clothing: ClothingCategory, image: ImageData) -> Self {
        self.clothing_variants.insert(clothing, image);
        self
    }

    /// Attach a textual outfit description for a clothing category.
    pub fn with_clothing_description(
        mut self,
        clothing: ClothingCategory,
        description: impl Into<String>,
    ) -> Self {
        self.clothing_descriptions.insert(clothing, description.into());
        self
    }

    /// First whitespace-separated word of the name.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// Body/clothing reference for a category, falling back to the main reference.
    pub fn source_image(&self, clothing: ClothingCategory) -> &ImageData {
        self.clothing_variants
            .get(&clothing)
            .unwrap_or(&self.reference_image)
    }

    /// Identity photo to compare against, only when it differs from the source image.
    pub fn identity_for(&self, clothing: ClothingCategory) -> Option<&ImageData> {
        let source = self.source_image(clothing);
        self.identity_image
            .as_ref()
            .filter(|identity| !identity.same_content(source))
    }

    /// Outfit description for a category, if one was supplied.
    pub fn clothing_description(&self, clothing: ClothingCategory) -> Option<&str> {
        self.clothing_descriptions.get(&clothing).map(String::as_str)
    }

    /// Previously styled render for a style and clothing category.
    pub fn styled_variant(&self, style: &str, clothing: ClothingCategory) -> Option<&ImageData> {
        self.styled_variants.get(&(style.to_lowercase(), clothing))
    }

    /// Record a styled render for later reuse within the job.
    pub fn set_styled_variant(&mut self, style: &str, clothing: ClothingCategory, image: ImageData) {
        tracing::debug!(
            character = %self.name,
            style,
            clothing = %clothing,
            "Recording styled variant"
        );
        self.styled_variants
            .insert((style.to_lowercase(), clothing), image);
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}
