//! Styled avatar cache with single-flight generation.
//!
//! Every key is in one of three states: absent, in flight, or cached. The
//! transitions happen under one lock, so a key is never cached and in flight
//! at the same time, and a second caller for a key that is in flight awaits
//! the first caller's result instead of starting another generation.
//!
//! A cache lives for one story-generation job. Call [`StyledAssetCache::clear`]
//! when the job ends.

use crate::{ConversionJob, Disposition, GenerationAudit, StyleConverter, StyleLibrary};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use futures::future::{BoxFuture, FutureExt, Shared, join_all};
use parking_lot::Mutex;
use picturebook_core::{AvatarCacheKey, Character, ImageData};
use picturebook_error::PicturebookResult;
use picturebook_narrative::AssetRequirements;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument, warn};

/// Where an image returned by the cache came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Provenance {
    /// Served from the cache without generating
    Cached,
    /// Freshly generated and accepted
    Styled,
    /// Freshly generated but below the quality thresholds
    BestEffort,
    /// Source reference returned as-is
    Unstyled,
}

impl From<Disposition> for Provenance {
    fn from(disposition: Disposition) -> Self {
        match disposition {
            Disposition::Styled => Provenance::Styled,
            Disposition::BestEffort => Provenance::BestEffort,
            Disposition::Unstyled => Provenance::Unstyled,
        }
    }
}

/// An image plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledImage {
    /// The image to render with
    pub image: ImageData,
    /// Where it came from
    pub provenance: Provenance,
}

/// A stored styled avatar.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct CachedAsset {
    key: AvatarCacheKey,
    image: ImageData,
    created_at: DateTime<Utc>,
}

type PendingImage = Shared<BoxFuture<'static, StyledImage>>;

struct InFlight {
    epoch: u64,
    result: PendingImage,
}

#[derive(Default)]
struct CacheState {
    cache: HashMap<AvatarCacheKey, CachedAsset>,
    in_flight: HashMap<AvatarCacheKey, InFlight>,
    audit: Vec<GenerationAudit>,
    epoch: u64,
}

impl std::fmt::Debug for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheState")
            .field("cached", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .field("epoch", &self.epoch)
            .finish()
    }
}

/// Removes an in-flight registration if its generation unwinds without completing.
///
/// The in-flight map holds its own `Shared` clone, so a generation whose
/// waiters all go away stays parked and the next caller for the key resumes
/// it. The guard therefore only fires on a panic inside the generation. A
/// completed generation disarms the guard after unregistering itself.
struct InFlightGuard {
    state: Weak<Mutex<CacheState>>,
    key: AvatarCacheKey,
    epoch: u64,
    armed: bool,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let removed = {
            let mut state = state.lock();
            match state.in_flight.get(&self.key) {
                Some(flight) if flight.epoch == self.epoch => state.in_flight.remove(&self.key),
                _ => None,
            }
        };
        if removed.is_some() {
            warn!(key = %self.key, "Generation ended without completing, registration released");
        }
    }
}

/// Summary of one [`StyledAssetCache::prepare_all`] batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreparationReport {
    /// Art style the batch ran for
    pub style: String,
    /// Distinct (character, clothing) pairs required
    pub requested: usize,
    /// Pairs already in the cache
    pub already_cached: usize,
    /// Pairs generated and accepted
    pub styled: usize,
    /// Pairs generated below the quality thresholds
    pub best_effort: usize,
    /// Pairs left with the unstyled source image
    pub fallbacks: usize,
    /// Required names missing from the roster
    pub unknown_characters: Vec<String>,
    /// True when the style skips generation entirely
    pub passthrough: bool,
}

/// Keyed store of styled avatars for one story-generation job.
///
/// Cloning is cheap and every clone shares the same store.
///
/// # Examples
///
/// ```no_run
/// use picturebook_cache::{PicturebookConfig, StyleConverter, StyleLibrary, StyledAssetCache};
/// use picturebook_core::{AvatarCacheKey, ClothingCategory, ImageData};
/// use picturebook_interface::ImageGenerator;
/// use std::sync::Arc;
///
/// # async fn run(generator: Arc<dyn ImageGenerator>) -> Result<(), Box<dyn std::error::Error>> {
/// let config = PicturebookConfig::load()?;
/// let styles = StyleLibrary::from_catalog(&config)?;
/// let converter = StyleConverter::new(generator, config.avatar().clone());
/// let cache = StyledAssetCache::new(converter, styles);
///
/// let photo = ImageData::new(std::fs::read("mia.jpg")?, "image/jpeg");
/// let key = AvatarCacheKey::new("Mia", ClothingCategory::Winter, "pixar");
/// let avatar = cache.get_or_create(&key, &photo, None, Some("red wool coat")).await?;
/// # let _ = avatar;
/// cache.clear();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StyledAssetCache {
    state: Arc<Mutex<CacheState>>,
    converter: Arc<StyleConverter>,
    styles: Arc<StyleLibrary>,
}

impl StyledAssetCache {
    /// Create an empty cache.
    pub fn new(converter: StyleConverter, styles: StyleLibrary) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            converter: Arc::new(converter),
            styles: Arc::new(styles),
        }
    }

    /// The style library this cache generates against.
    pub fn styles(&self) -> &StyleLibrary {
        &self.styles
    }

    /// Styled avatar for a key, generating it at most once.
    ///
    /// Always yields an image for a known style: when generation fails the
    /// unstyled `source` comes back and nothing is cached.
    ///
    /// # Errors
    ///
    /// A configuration error if the key's style is not in the catalog.
    pub async fn get_or_create(
        &self,
        key: &AvatarCacheKey,
        source: &ImageData,
        identity: Option<&ImageData>,
        clothing_description: Option<&str>,
    ) -> PicturebookResult<ImageData> {
        self.resolve(key, source, identity, clothing_description)
            .await
            .map(|styled| styled.image)
    }

    /// Like [`get_or_create`](Self::get_or_create), reporting where the image came from.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn resolve(
        &self,
        key: &AvatarCacheKey,
        source: &ImageData,
        identity: Option<&ImageData>,
        clothing_description: Option<&str>,
    ) -> PicturebookResult<StyledImage> {
        if self.styles.is_passthrough(key.style()) {
            debug!("Pass-through style, using reference image");
            return Ok(StyledImage {
                image: source.clone(),
                provenance: Provenance::Unstyled,
            });
        }
        let style = self.styles.require_style(key.style())?.clone();

        let pending = {
            let mut state = self.state.lock();
            if let Some(asset) = state.cache.get(key) {
                debug!("Cache hit");
                return Ok(StyledImage {
                    image: asset.image.clone(),
                    provenance: Provenance::Cached,
                });
            }
            if let Some(flight) = state.in_flight.get(key) {
                debug!("Generation already in flight, awaiting it");
                flight.result.clone()
            } else {
                let job = ConversionJob::new(key.clone(), style, source.clone())
                    .with_identity(identity.cloned())
                    .with_clothing_description(clothing_description.map(str::to_owned));
                let epoch = state.epoch;
                let pending = self.generate(job, epoch).boxed().shared();
                state.in_flight.insert(
                    key.clone(),
                    InFlight {
                        epoch,
                        result: pending.clone(),
                    },
                );
                debug!(epoch, "Registered in-flight generation");
                pending
            }
        };

        Ok(pending.await)
    }

    /// The generation future shared by every caller of one key.
    fn generate(
        &self,
        job: ConversionJob,
        epoch: u64,
    ) -> impl std::future::Future<Output = StyledImage> + Send + 'static {
        let converter = Arc::clone(&self.converter);
        let state = Arc::downgrade(&self.state);

        async move {
            let mut guard = InFlightGuard {
                state: state.clone(),
                key: job.key().clone(),
                epoch,
                armed: true,
            };

            let conversion = converter.convert(&job).await;
            let provenance = Provenance::from(conversion.disposition);

            if let Some(state) = state.upgrade() {
                let finished = {
                    let mut state = state.lock();
                    guard.armed = false;
                    if state.epoch == epoch {
                        if provenance != Provenance::Unstyled {
                            state.cache.insert(
                                job.key().clone(),
                                CachedAsset {
                                    key: job.key().clone(),
                                    image: conversion.image.clone(),
                                    created_at: Utc::now(),
                                },
                            );
                        }
                        state.audit.push(conversion.audit);
                        state.in_flight.remove(job.key())
                    } else {
                        debug!(key = %job.key(), "Cache cleared during generation, result not stored");
                        None
                    }
                };
                drop(finished);
            }

            StyledImage {
                image: conversion.image,
                provenance,
            }
        }
    }

    /// Cached image for a key, if any.
    pub fn get(&self, key: &AvatarCacheKey) -> Option<ImageData> {
        self.state
            .lock()
            .cache
            .get(key)
            .map(|asset| asset.image.clone())
    }

    /// Full cache entry for a key, if any.
    pub fn entry(&self, key: &AvatarCacheKey) -> Option<CachedAsset> {
        self.state.lock().cache.get(key).cloned()
    }

    /// Whether a key has a stored image.
    pub fn is_cached(&self, key: &AvatarCacheKey) -> bool {
        self.state.lock().cache.contains_key(key)
    }

    /// Whether a key is being generated right now.
    pub fn is_in_flight(&self, key: &AvatarCacheKey) -> bool {
        self.state.lock().in_flight.contains_key(key)
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.state.lock().cache.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.state.lock().cache.is_empty()
    }

    /// Audits of every generation finished since the last clear.
    pub fn audit_log(&self) -> Vec<GenerationAudit> {
        self.state.lock().audit.clone()
    }

    /// Drop all cached images, in-flight registrations and audits.
    ///
    /// Generations still running finish for their callers but are not stored.
    /// Their registrations are gone, so a caller arriving after `clear()` starts
    /// a fresh generation for the same key even while the old one is running.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let (cache, in_flight, audit, epoch) = {
            let mut state = self.state.lock();
            state.epoch += 1;
            (
                std::mem::take(&mut state.cache),
                std::mem::take(&mut state.in_flight),
                std::mem::take(&mut state.audit),
                state.epoch,
            )
        };
        info!(
            cached = cache.len(),
            in_flight = in_flight.len(),
            audits = audit.len(),
            epoch,
            "Cleared styled asset cache"
        );
    }

    /// Generate every avatar a story needs, concurrently.
    ///
    /// Pass-through styles and keys already cached are skipped. Styled and
    /// best-effort results are written back onto the roster characters;
    /// unstyled fallbacks are not. Individual failures never fail the batch.
    ///
    /// # Errors
    ///
    /// A configuration error if the style is not in the catalog.
    #[instrument(skip(self, characters, requirements), fields(requested = requirements.len()))]
    pub async fn prepare_all(
        &self,
        characters: &mut [Character],
        style: &str,
        requirements: &AssetRequirements,
    ) -> PicturebookResult<PreparationReport> {
        let mut report = PreparationReport {
            style: style.trim().to_string(),
            requested: requirements.len(),
            ..PreparationReport::default()
        };

        if self.styles.is_passthrough(style) {
            info!(style, "Pass-through style, no avatars to generate");
            report.passthrough = true;
            return Ok(report);
        }
        self.styles.require_style(style)?;

        let mut jobs = Vec::new();
        for requirement in requirements.requirements() {
            let Some(character) = characters
                .iter_mut()
                .find(|character| character.is_named(&requirement.character))
            else {
                warn!(character = %requirement.character, "Required character is not on the roster");
                if !report.unknown_characters.contains(&requirement.character) {
                    report.unknown_characters.push(requirement.character.clone());
                }
                continue;
            };

            let key = requirement.cache_key(style);
            if let Some(image) = self.get(&key) {
                debug!(key = %key, "Already cached");
                character.set_styled_variant(style, requirement.clothing, image);
                report.already_cached += 1;
                continue;
            }

            let clothing = requirement.clothing;
            jobs.push((
                character.name().clone(),
                key,
                character.source_image(clothing).clone(),
                character.identity_for(clothing).cloned(),
                character.clothing_description(clothing).map(str::to_owned),
            ));
        }

        let results = join_all(jobs.iter().map(
            |(_, key, source, identity, clothing_description)| {
                self.resolve(key, source, identity.as_ref(), clothing_description.as_deref())
            },
        ))
        .await;

        for ((name, key, ..), result) in jobs.iter().zip(results) {
            let styled = match result {
                Ok(styled) => styled,
                Err(e) => {
                    warn!(key = %key, error = %e, "Avatar preparation failed");
                    report.fallbacks += 1;
                    continue;
                }
            };
            match styled.provenance {
                Provenance::Styled => report.styled += 1,
                Provenance::BestEffort => report.best_effort += 1,
                Provenance::Cached => report.already_cached += 1,
                Provenance::Unstyled => {
                    report.fallbacks += 1;
                    continue;
                }
            }
            if let Some(character) = characters.iter_mut().find(|c| c.name() == name) {
                character.set_styled_variant(style, *key.clothing(), styled.image);
            }
        }

        info!(
            style = %report.style,
            requested = report.requested,
            already_cached = report.already_cached,
            styled = report.styled,
            best_effort = report.best_effort,
            fallbacks = report.fallbacks,
            unknown = report.unknown_characters.len(),
            "Avatar preparation finished"
        );
        Ok(report)
    }
}
