//! Narrative parsing for Picturebook.
//!
//! This crate turns semi-structured model output into structured facts:
//!
//! - **Keyword registry**: per-language keyword tables compiled into matchers
//! - **Outline parser**: title, per-page scene hints, clothing plan, cover scenes
//! - **Scene metadata**: embedded JSON block first, text patterns as fallback
//! - **Entity resolver**: matches scene text back to the character roster
//! - **Requirement collector**: every (character, clothing) pair the book needs
//!
//! Everything here is synchronous and never fails on unexpected text: a field
//! that cannot be found comes back as `None` or an empty collection.
//!
//! # Example
//!
//! ```
//! use picturebook_narrative::Outline;
//! use picturebook_core::ClothingCategory;
//!
//! let outline = Outline::new(
//!     "# Story\nTitle: Mia and the Snow Fox\n\n## Page 1\nScene: Mia wakes up to a snowy garden.\nClothing: winter\n",
//! );
//!
//! assert_eq!(outline.extract_title().as_deref(), Some("Mia and the Snow Fox"));
//! assert_eq!(outline.extract_clothing_map(1).for_page(1), ClothingCategory::Winter);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cover;
mod extraction;
pub mod keywords;
mod metadata;
mod names;
mod outline;
mod requirements;
mod resolver;

pub use extraction::{CodeBlock, find_code_block};
pub use keywords::{Field, Language};
pub use metadata::{
    extract_scene_metadata, extract_structured_metadata, parse_clothing_category,
    strip_scene_metadata,
};
pub use outline::{Outline, PageSlice};
pub use requirements::{AssetRequirement, AssetRequirements, SceneSlot, collect_asset_requirements};
pub use resolver::{ResolutionStrategy, resolve_characters_in_scene, resolve_with_strategy};
