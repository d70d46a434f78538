//! Core data types for the Picturebook narrative asset pipeline.
//!
//! This crate provides the foundation data types shared by the outline parser,
//! the entity resolver and the styled asset cache.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache_key;
mod character;
mod clothing;
mod cover;
mod image;
mod outline;
mod record;
mod scene;

pub use cache_key::AvatarCacheKey;
pub use character::Character;
pub use clothing::ClothingCategory;
pub use cover::{CoverScene, CoverScenes, CoverSlot};
pub use image::ImageData;
pub use outline::{ClothingPlan, PageHeader};
pub use record::{
    CharacterRecord, CurrentRecord, FlatPhotoRecord, LegacyAvatarSet, NestedAvatarRecord,
    normalize_roster, parse_roster_json,
};
pub use scene::SceneMetadata;
