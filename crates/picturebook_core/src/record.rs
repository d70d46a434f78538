//! Ingestion of character records in every historical JSON shape.
//!
//! Older jobs stored avatars in different layouts. All of them are accepted
//! here and normalized once into [`Character`], so nothing downstream needs to
//! know which shape a record arrived in.

use crate::{Character, ClothingCategory, ImageData};
use picturebook_error::{CharacterError, CharacterErrorKind, JsonError, PicturebookResult};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// A character record in any known shape.
///
/// Variants are tried in declaration order; each legacy shape has a required
/// field the others lack.
///
/// # Examples
///
/// ```
/// use picturebook_core::{CharacterRecord, ClothingCategory};
///
/// let json = r#"{
///     "name": "Mia",
///     "photoUrl": "data:image/png;base64,iVBORw0KGgo=",
///     "clothingAvatars": { "winter": "data:image/png;base64,AAAA" }
/// }"#;
///
/// let record: CharacterRecord = serde_json::from_str(json).unwrap();
/// let mia = record.normalize().unwrap();
/// assert_eq!(mia.name(), "Mia");
/// assert!(mia.clothing_variants().contains_key(&ClothingCategory::Winter));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CharacterRecord {
    /// Current shape with explicit reference and identity images
    Current(CurrentRecord),
    /// Legacy shape with a nested `avatars` object
    NestedAvatars(NestedAvatarRecord),
    /// Oldest shape: a single photo plus flat per-clothing avatars
    FlatPhoto(FlatPhotoRecord),
}

/// Current record shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRecord {
    /// Character name
    pub name: String,
    /// Body reference image (data URI)
    pub reference_image: String,
    /// Face photo (data URI)
    #[serde(default)]
    pub identity_image: Option<String>,
    /// Clothing category to image (data URI)
    #[serde(default)]
    pub clothing_variants: HashMap<String, String>,
    /// Clothing category to outfit description
    #[serde(default)]
    pub clothing_descriptions: HashMap<String, String>,
}

/// Legacy record with an `avatars` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedAvatarRecord {
    /// Character name
    pub name: String,
    /// Avatar images by slot
    pub avatars: LegacyAvatarSet,
    /// Original uploaded photo
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Outfit descriptions by clothing category
    #[serde(default)]
    pub clothing: HashMap<String, String>,
}

/// Avatar slots of the nested legacy shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAvatarSet {
    /// Cropped face used for identity checks
    #[serde(default)]
    pub face_thumbnail: Option<String>,
    /// Everyday outfit
    #[serde(default)]
    pub standard: Option<String>,
    /// Winter outfit
    #[serde(default)]
    pub winter: Option<String>,
    /// Summer outfit
    #[serde(default)]
    pub summer: Option<String>,
    /// Formal outfit
    #[serde(default)]
    pub formal: Option<String>,
}

/// Oldest record shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatPhotoRecord {
    /// Character name
    pub name: String,
    /// Uploaded photo
    pub photo_url: String,
    /// Clothing category to avatar image
    #[serde(default)]
    pub clothing_avatars: HashMap<String, String>,
}

impl CharacterRecord {
    /// Name as stored in the record.
    pub fn name(&self) -> &str {
        match self {
            CharacterRecord::Current(r) => &r.name,
            CharacterRecord::NestedAvatars(r) => &r.name,
            CharacterRecord::FlatPhoto(r) => &r.name,
        }
    }

    /// Convert into the canonical [`Character`].
    ///
    /// # Errors
    ///
    /// Fails when the name is empty, no reference image can be found, or an
    /// image string is not a valid data URI.
    #[instrument(skip(self), fields(name = %self.name()))]
    pub fn normalize(self) -> PicturebookResult<Character> {
        if self.name().trim().is_empty() {
            return Err(CharacterError::new(CharacterErrorKind::EmptyName).into());
        }

        let character = match self {
            CharacterRecord::Current(record) => {
                debug!("Normalizing current character record");
                let mut character =
                    Character::new(&record.name, ImageData::from_data_uri(&record.reference_image)?);
                if let Some(identity) = &record.identity_image {
                    character = character.with_identity_image(ImageData::from_data_uri(identity)?);
                }
                for (clothing, image) in categorized(&record.clothing_variants) {
                    character =
                        character.with_clothing_variant(clothing, ImageData::from_data_uri(image)?);
                }
                for (clothing, text) in categorized(&record.clothing_descriptions) {
                    character = character.with_clothing_description(clothing, text.as_str());
                }
                character
            }
            CharacterRecord::NestedAvatars(record) => {
                debug!("Normalizing nested-avatar legacy record");
                let avatars = &record.avatars;
                let slots = [
                    (ClothingCategory::Standard, &avatars.standard),
                    (ClothingCategory::Winter, &avatars.winter),
                    (ClothingCategory::Summer, &avatars.summer),
                    (ClothingCategory::Formal, &avatars.formal),
                ];
                let reference = avatars
                    .standard
                    .as_ref()
                    .or(record.photo_url.as_ref())
                    .or(avatars.face_thumbnail.as_ref())
                    .ok_or_else(|| {
                        CharacterError::new(CharacterErrorKind::MissingReferenceImage(
                            record.name.clone(),
                        ))
                    })?;

                let mut character =
                    Character::new(&record.name, ImageData::from_data_uri(reference)?);
                if let Some(face) = avatars.face_thumbnail.as_ref().or(record.photo_url.as_ref()) {
                    character = character.with_identity_image(ImageData::from_data_uri(face)?);
                }
                for (clothing, image) in slots {
                    if let Some(image) = image {
                        character = character
                            .with_clothing_variant(clothing, ImageData::from_data_uri(image)?);
                    }
                }
                for (clothing, text) in categorized(&record.clothing) {
                    character = character.with_clothing_description(clothing, text.as_str());
                }
                character
            }
            CharacterRecord::FlatPhoto(record) => {
                debug!("Normalizing flat-photo legacy record");
                let photo = ImageData::from_data_uri(&record.photo_url)?;
                let mut character =
                    Character::new(&record.name, photo.clone()).with_identity_image(photo);
                for (clothing, image) in categorized(&record.clothing_avatars) {
                    character =
                        character.with_clothing_variant(clothing, ImageData::from_data_uri(image)?);
                }
                character
            }
        };

        Ok(character)
    }
}

/// Entries whose key is a known clothing category; others are skipped.
fn categorized(map: &HashMap<String, String>) -> Vec<(ClothingCategory, &String)> {
    let mut entries: Vec<_> = map
        .iter()
        .filter_map(|(key, value)| match ClothingCategory::from_token(key) {
            Some(category) => Some((category, value)),
            None => {
                debug!(key = %key, "Skipping unknown clothing key in character record");
                None
            }
        })
        .collect();
    entries.sort_by_key(|(category, _)| *category);
    entries
}

/// Normalize a whole roster, rejecting duplicate names.
///
/// # Errors
///
/// Fails on the first record that cannot be normalized, or when two records
/// share a name (case-insensitive).
pub fn normalize_roster(records: Vec<CharacterRecord>) -> PicturebookResult<Vec<Character>> {
    let mut seen = HashSet::new();
    let mut roster = Vec::with_capacity(records.len());
    for record in records {
        let character = record.normalize()?;
        if !seen.insert(character.name().to_lowercase()) {
            return Err(CharacterError::new(CharacterErrorKind::DuplicateName(
                character.name().clone(),
            ))
            .into());
        }
        roster.push(character);
    }
    Ok(roster)
}

/// Parse a JSON array of character records and normalize it.
///
/// # Errors
///
/// Fails when the JSON is malformed or any record is invalid.
pub fn parse_roster_json(json: &str) -> PicturebookResult<Vec<Character>> {
    let records: Vec<CharacterRecord> =
        serde_json::from_str(json).map_err(|e| JsonError::parse(e, json))?;
    normalize_roster(records)
}
