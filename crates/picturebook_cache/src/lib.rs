//! Styled avatar cache for the Picturebook pipeline.
//!
//! Converts character reference photos into a target art style through an
//! external [`ImageGenerator`](picturebook_interface::ImageGenerator), checks
//! the results with an optional [`QualityGate`](picturebook_interface::QualityGate)
//! and keeps one styled avatar per (character, clothing, style) key for the
//! duration of a story-generation job.
//!
//! # Components
//!
//! - [`PicturebookConfig`] - avatar settings and the style catalog, loaded from TOML
//! - [`StyleLibrary`] - the catalog with exemplar images read from disk
//! - [`StyleConverter`] - one avatar's generation procedure with bounded retries
//! - [`StyledAssetCache`] - single-flight cache in front of the converter
//!
//! # Example
//!
//! ```no_run
//! use picturebook_cache::{PicturebookConfig, StyleConverter, StyleLibrary, StyledAssetCache};
//! use picturebook_core::Character;
//! use picturebook_interface::ImageGenerator;
//! use picturebook_narrative::AssetRequirements;
//! use std::sync::Arc;
//!
//! # async fn run(
//! #     generator: Arc<dyn ImageGenerator>,
//! #     mut roster: Vec<Character>,
//! #     requirements: AssetRequirements,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = PicturebookConfig::load()?;
//! let styles = StyleLibrary::from_catalog(&config)?;
//! let cache = StyledAssetCache::new(StyleConverter::new(generator, config.avatar().clone()), styles);
//!
//! let report = cache.prepare_all(&mut roster, "watercolor", &requirements).await?;
//! println!("{} styled, {} fallbacks", report.styled, report.fallbacks);
//! cache.clear();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audit;
mod cache;
mod config;
mod generation;
mod imaging;
mod style;

pub use audit::{AttemptOutcome, AttemptRecord, Disposition, GenerationAudit};
pub use cache::{CachedAsset, PreparationReport, Provenance, StyledAssetCache, StyledImage};
pub use config::{AvatarSettings, PicturebookConfig, StyleDefinition};
pub use generation::{Conversion, ConversionJob, StyleConverter};
pub use imaging::{downscale, prepare_for_storage};
pub use style::{ResolvedStyle, StyleLibrary};
