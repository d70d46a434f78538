//! Cover scenes: the three illustrated slots outside the numbered pages.

use crate::ClothingCategory;
use serde::{Deserialize, Serialize};

/// One of the three non-page illustration slots.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoverSlot {
    /// Front cover / title page
    TitlePage,
    /// Dedication or introduction page before page 1
    InitialPage,
    /// Back cover
    BackCover,
}

/// Scene text and clothing for a cover slot.
///
/// An empty `scene` means neither outline dialect described the slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoverScene {
    /// Scene description, possibly empty
    pub scene: String,
    /// Clothing stated for the slot, if any
    pub clothing: Option<ClothingCategory>,
}

impl CoverScene {
    /// Whether a scene description was found.
    pub fn is_empty(&self) -> bool {
        self.scene.trim().is_empty()
    }
}

/// The three cover scenes of one outline.
///
/// # Examples
///
/// ```
/// use picturebook_core::{CoverScene, CoverScenes, CoverSlot};
///
/// let mut covers = CoverScenes::default();
/// covers.title_page.scene = "Mia and Leo on a snowy hill".to_string();
///
/// assert!(!covers.get(CoverSlot::TitlePage).is_empty());
/// assert!(covers.get(CoverSlot::BackCover).is_empty());
/// assert_eq!(covers.iter().count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoverScenes {
    /// Front cover
    pub title_page: CoverScene,
    /// Page before the story starts
    pub initial_page: CoverScene,
    /// Back cover
    pub back_cover: CoverScene,
}

impl CoverScenes {
    /// Scene for a slot.
    pub fn get(&self, slot: CoverSlot) -> &CoverScene {
        match slot {
            CoverSlot::TitlePage => &self.title_page,
            CoverSlot::InitialPage => &self.initial_page,
            CoverSlot::BackCover => &self.back_cover,
        }
    }

    /// Mutable scene for a slot.
    pub fn get_mut(&mut self, slot: CoverSlot) -> &mut CoverScene {
        match slot {
            CoverSlot::TitlePage => &mut self.title_page,
            CoverSlot::InitialPage => &mut self.initial_page,
            CoverSlot::BackCover => &mut self.back_cover,
        }
    }

    /// All slots with their scenes, in book order.
    pub fn iter(&self) -> impl Iterator<Item = (CoverSlot, &CoverScene)> {
        [
            (CoverSlot::TitlePage, &self.title_page),
            (CoverSlot::InitialPage, &self.initial_page),
            (CoverSlot::BackCover, &self.back_cover),
        ]
        .into_iter()
    }
}
