//! Asset requirements: every (character, clothing) pair a book needs.

use crate::metadata::parse_clothing_category;
use crate::resolver::resolve_characters_in_scene;
use picturebook_core::{
    AvatarCacheKey, Character, ClothingCategory, ClothingPlan, CoverScenes, CoverSlot,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// One styled image that must exist before rendering starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AssetRequirement {
    /// Roster name of the character
    pub character: String,
    /// Clothing the character wears
    pub clothing: ClothingCategory,
}

impl AssetRequirement {
    /// Cache key for this requirement in a given art style.
    pub fn cache_key(&self, style: &str) -> AvatarCacheKey {
        AvatarCacheKey::new(&self.character, self.clothing, style)
    }
}

/// Where in the book a requirement comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum SceneSlot {
    /// A numbered story page
    #[display("page {}", _0)]
    Page(u32),
    /// A cover slot
    #[display("{}", _0)]
    Cover(CoverSlot),
}

/// Deduplicated requirements with the slots that need each one.
///
/// Iteration order is stable: by character name, then clothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetRequirements {
    entries: BTreeMap<AssetRequirement, Vec<SceneSlot>>,
}

impl AssetRequirements {
    /// Record that `slot` needs `character` in `clothing`.
    pub fn insert(&mut self, character: &str, clothing: ClothingCategory, slot: SceneSlot) {
        let slots = self
            .entries
            .entry(AssetRequirement {
                character: character.to_string(),
                clothing,
            })
            .or_default();
        if !slots.contains(&slot) {
            slots.push(slot);
        }
    }

    /// Requirements with their slots.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetRequirement, &[SceneSlot])> {
        self.entries.iter().map(|(req, slots)| (req, slots.as_slice()))
    }

    /// Requirements only.
    pub fn requirements(&self) -> impl Iterator<Item = &AssetRequirement> {
        self.entries.keys()
    }

    /// Number of distinct requirements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is required.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slots needing a requirement, empty if it is not required.
    pub fn slots_for(&self, requirement: &AssetRequirement) -> &[SceneSlot] {
        self.entries.get(requirement).map_or(&[], Vec::as_slice)
    }

    /// Cache keys for every requirement in a style.
    pub fn keys(&self, style: &str) -> Vec<AvatarCacheKey> {
        self.entries.keys().map(|req| req.cache_key(style)).collect()
    }
}

/// Walk every page scene and cover slot and collect what must be styled.
///
/// A page's clothing is the one its scene states, else the clothing plan's
/// value for that page. A cover uses its own clothing, else the primary. A
/// cover that is empty or names nobody from the roster requires every
/// character, since covers usually show the whole cast.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use picturebook_core::{Character, ClothingCategory, ClothingPlan, CoverScenes, ImageData};
/// use picturebook_narrative::collect_asset_requirements;
///
/// let photo = ImageData::new(vec![1, 2, 3], "image/png");
/// let roster = vec![Character::new("Mia", photo.clone()), Character::new("Leo", photo)];
/// let scenes = BTreeMap::from([(1, "Mia builds a snowman.".to_string())]);
/// let plan = ClothingPlan::uniform(ClothingCategory::Winter, 1);
///
/// let required = collect_asset_requirements(&scenes, &plan, &CoverScenes::default(), &roster);
/// // Mia for page 1; both for the empty covers.
/// assert_eq!(required.len(), 2);
/// ```
#[tracing::instrument(skip_all, fields(pages = scenes.len(), roster = roster.len()))]
pub fn collect_asset_requirements(
    scenes: &BTreeMap<u32, String>,
    clothing: &ClothingPlan,
    covers: &CoverScenes,
    roster: &[Character],
) -> AssetRequirements {
    let mut required = AssetRequirements::default();

    for (page, scene) in scenes {
        let category = parse_clothing_category(scene).unwrap_or_else(|| clothing.for_page(*page));
        for character in resolve_characters_in_scene(scene, roster) {
            required.insert(character.name(), category, SceneSlot::Page(*page));
        }
    }

    for (slot, cover) in covers.iter() {
        let category = cover.clothing.unwrap_or(clothing.primary);
        let present = if cover.is_empty() {
            Vec::new()
        } else {
            resolve_characters_in_scene(&cover.scene, roster)
        };
        let cast: Vec<&Character> = if present.is_empty() {
            tracing::debug!(%slot, "Cover names nobody, requiring the whole roster");
            roster.iter().collect()
        } else {
            present
        };
        for character in cast {
            required.insert(character.name(), category, SceneSlot::Cover(slot));
        }
    }

    tracing::info!(count = required.len(), "Collected asset requirements");
    required
}
