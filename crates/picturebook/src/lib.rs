//! Picturebook - narrative asset pipeline for personalised picture books
//!
//! Picturebook turns the semi-structured outline a text model writes for a
//! children's book into the concrete assets an illustrator needs: which
//! characters appear on which page, what they wear, and a styled avatar for
//! every (character, clothing, art style) combination.
//!
//! # Features
//!
//! - **Outline parsing**: titles, page scenes, clothing plans and cover scenes
//!   from English, German and French outlines
//! - **Entity resolution**: scene text matched back to roster characters through
//!   layered fallbacks
//! - **Asset requirements**: the deduplicated avatar set a whole book needs
//! - **Styled asset cache**: single-flight avatar generation with a quality gate
//!   and bounded retries
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use picturebook::{Outline, collect_asset_requirements, parse_roster_json};
//!
//! let outline = Outline::new(std::fs::read_to_string("outline.md")?);
//! let roster = parse_roster_json(&std::fs::read_to_string("roster.json")?)?;
//!
//! let requirements = collect_asset_requirements(
//!     &outline.extract_scene_hints(),
//!     &outline.extract_clothing_map(outline.page_count()),
//!     &outline.extract_cover_scenes(),
//!     &roster,
//! );
//! for (requirement, slots) in requirements.iter() {
//!     println!("{} ({}) on {} slots", requirement.character, requirement.clothing, slots.len());
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `observability` - OpenTelemetry span export via `init_observability`
//!
//! # Architecture
//!
//! - `picturebook_error` - Error types
//! - `picturebook_core` - Core data types (Character, ImageData, ClothingCategory, ...)
//! - `picturebook_interface` - ImageGenerator and QualityGate traits
//! - `picturebook_narrative` - Outline parser, metadata extractor, resolver, requirements
//! - `picturebook_cache` - Style catalog, avatar generation and the styled asset cache
//!
//! This crate (`picturebook`) re-exports everything for convenience.

pub use picturebook_cache::*;
pub use picturebook_core::*;
pub use picturebook_error::*;
pub use picturebook_interface::*;
pub use picturebook_narrative::*;

mod observability;

#[cfg(feature = "observability")]
pub use observability::init_observability;
pub use observability::{LoggingConfig, init_logging};
