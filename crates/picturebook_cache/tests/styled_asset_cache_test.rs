//! Tests for the styled asset cache: single-flight, retries, fallbacks and batches.

use async_trait::async_trait;
use picturebook_cache::{
    AvatarSettings, Disposition, Provenance, ResolvedStyle, StyleConverter, StyleLibrary,
    StyledAssetCache,
};
use picturebook_core::{AvatarCacheKey, Character, ClothingCategory, ImageData};
use picturebook_error::{
    GenerationError, GenerationErrorKind, PicturebookErrorKind, PicturebookResult,
};
use picturebook_interface::{ImageGenerator, QualityGate, QualityScores, StyleConversionRequest};
use picturebook_narrative::{AssetRequirements, SceneSlot};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How the mock generator responds.
#[derive(Clone, Copy)]
enum Behavior {
    Image,
    NoImage,
    Fail,
}

/// Image generator with a call counter and optional latency.
struct MockGenerator {
    calls: AtomicUsize,
    delay: Duration,
    behavior: Behavior,
}

impl MockGenerator {
    fn new(behavior: Behavior) -> Arc<Self> {
        Self::slow(behavior, Duration::ZERO)
    }

    fn slow(behavior: Behavior, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            behavior,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for MockGenerator {
    async fn generate(
        &self,
        request: &StyleConversionRequest,
    ) -> PicturebookResult<Option<ImageData>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.behavior {
            Behavior::Image => Ok(Some(ImageData::new(
                format!("styled-{}-{}", call, request.attempt()).into_bytes(),
                "application/octet-stream",
            ))),
            Behavior::NoImage => Ok(None),
            Behavior::Fail => Err(GenerationError::new(GenerationErrorKind::Capability(
                "generator unavailable".to_string(),
            ))
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Quality gate that always returns the same scores.
struct FixedGate {
    scores: QualityScores,
    calls: AtomicUsize,
}

#[async_trait]
impl QualityGate for FixedGate {
    async fn evaluate(
        &self,
        _identity: &ImageData,
        _candidate: &ImageData,
        _expected_clothing: Option<&str>,
    ) -> PicturebookResult<QualityScores> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores)
    }
}

fn settings() -> AvatarSettings {
    AvatarSettings::default().with_retry_backoff_ms(0)
}

fn library() -> StyleLibrary {
    StyleLibrary::new(
        [
            ResolvedStyle::new("pixar", "3D animated film character"),
            ResolvedStyle::new("watercolor", "Soft watercolour illustration"),
        ],
        ["realistic"],
    )
}

fn cache_with(generator: Arc<MockGenerator>) -> StyledAssetCache {
    StyledAssetCache::new(StyleConverter::new(generator, settings()), library())
}

fn photo(byte: u8) -> ImageData {
    ImageData::new(vec![byte; 32], "image/jpeg")
}

fn mia_winter() -> AvatarCacheKey {
    AvatarCacheKey::new("Mia", ClothingCategory::Winter, "pixar")
}

#[tokio::test]
async fn test_concurrent_requests_generate_once() -> anyhow::Result<()> {
    let generator = MockGenerator::slow(Behavior::Image, Duration::from_millis(50));
    let cache = cache_with(generator.clone());
    let key = mia_winter();
    let source = photo(1);

    let (first, second) = tokio::join!(
        cache.get_or_create(&key, &source, None, None),
        cache.get_or_create(&key, &source, None, None),
    );
    let (first, second) = (first?, second?);

    assert_eq!(generator.calls(), 1);
    assert!(first.ptr_eq(&second));
    assert!(cache.is_cached(&key));
    assert!(!cache.is_in_flight(&key));
    Ok(())
}

#[tokio::test]
async fn test_spawned_tasks_share_one_generation() -> anyhow::Result<()> {
    let generator = MockGenerator::slow(Behavior::Image, Duration::from_millis(30));
    let cache = cache_with(generator.clone());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache.get_or_create(&mia_winter(), &photo(1), None, None).await
        }));
    }

    let mut images = Vec::new();
    for handle in handles {
        images.push(handle.await??);
    }

    assert_eq!(generator.calls(), 1);
    assert!(images.iter().all(|image| image.ptr_eq(&images[0])));
    Ok(())
}

#[tokio::test]
async fn test_distinct_keys_generate_independently() -> anyhow::Result<()> {
    let generator = MockGenerator::new(Behavior::Image);
    let cache = cache_with(generator.clone());
    let source = photo(1);

    let winter = mia_winter();
    let summer = AvatarCacheKey::new("Mia", ClothingCategory::Summer, "pixar");
    let watercolor = AvatarCacheKey::new("Mia", ClothingCategory::Winter, "watercolor");
    let (a, b, c) = tokio::join!(
        cache.get_or_create(&winter, &source, None, None),
        cache.get_or_create(&summer, &source, None, None),
        cache.get_or_create(&watercolor, &source, None, None),
    );

    assert_eq!(generator.calls(), 3);
    assert!(!a?.ptr_eq(&b?));
    assert!(c.is_ok());
    assert_eq!(cache.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_cache_hit_skips_generation() -> anyhow::Result<()> {
    let generator = MockGenerator::new(Behavior::Image);
    let cache = cache_with(generator.clone());
    let key = mia_winter();

    let first = cache.resolve(&key, &photo(1), None, None).await?;
    let second = cache.resolve(&key, &photo(1), None, None).await?;

    assert_eq!(first.provenance, Provenance::Styled);
    assert_eq!(second.provenance, Provenance::Cached);
    assert!(first.image.ptr_eq(&second.image));
    assert_eq!(generator.calls(), 1);

    // Character names are case-insensitive in keys.
    let shouted = AvatarCacheKey::new("MIA", ClothingCategory::Winter, "pixar");
    assert!(cache.get(&shouted).is_some());
    Ok(())
}

#[tokio::test]
async fn test_low_scores_retry_exactly_max_attempts() -> anyhow::Result<()> {
    let generator = MockGenerator::new(Behavior::Image);
    let gate = Arc::new(FixedGate {
        scores: QualityScores::new(1, Some(2)),
        calls: AtomicUsize::new(0),
    });
    let converter = StyleConverter::new(generator.clone(), settings()).with_quality_gate(gate.clone());
    let cache = StyledAssetCache::new(converter, library());
    let key = mia_winter();

    let styled = cache
        .resolve(&key, &photo(1), Some(&photo(2)), Some("red wool coat"))
        .await?;

    assert_eq!(generator.calls(), 2);
    assert_eq!(gate.calls.load(Ordering::SeqCst), 2);
    assert!(!styled.image.is_empty());
    assert_eq!(styled.provenance, Provenance::BestEffort);
    assert_eq!(styled.image.bytes(), b"styled-1-2");

    let audit = cache.audit_log();
    assert_eq!(audit.len(), 1);
    assert_eq!(*audit[0].disposition(), Disposition::BestEffort);
    assert_eq!(*audit[0].shortfall(), Some(QualityScores::new(1, Some(2))));
    Ok(())
}

#[tokio::test]
async fn test_gate_skipped_without_identity_photo() -> anyhow::Result<()> {
    let generator = MockGenerator::new(Behavior::Image);
    let gate = Arc::new(FixedGate {
        scores: QualityScores::new(0, None),
        calls: AtomicUsize::new(0),
    });
    let converter = StyleConverter::new(generator.clone(), settings()).with_quality_gate(gate.clone());
    let cache = StyledAssetCache::new(converter, library());
    let source = photo(1);

    // The identity photo equals the source, so there is nothing to compare against.
    let styled = cache
        .resolve(&mia_winter(), &source, Some(&source), None)
        .await?;

    assert_eq!(styled.provenance, Provenance::Styled);
    assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
    assert_eq!(generator.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_generation_falls_back_uncached() -> anyhow::Result<()> {
    for behavior in [Behavior::Fail, Behavior::NoImage] {
        let generator = MockGenerator::new(behavior);
        let cache = cache_with(generator.clone());
        let key = mia_winter();
        let source = photo(7);

        let styled = cache.resolve(&key, &source, None, None).await?;

        assert_eq!(styled.provenance, Provenance::Unstyled);
        assert!(styled.image.ptr_eq(&source));
        assert_eq!(generator.calls(), 2);
        assert!(!cache.is_cached(&key));
        assert!(!cache.is_in_flight(&key));

        // Back to absent: the next request tries again.
        cache.get_or_create(&key, &source, None, None).await?;
        assert_eq!(generator.calls(), 4);
    }
    Ok(())
}

#[tokio::test]
async fn test_passthrough_style_returns_source() -> anyhow::Result<()> {
    let generator = MockGenerator::new(Behavior::Image);
    let cache = cache_with(generator.clone());
    let key = AvatarCacheKey::new("Mia", ClothingCategory::Winter, "Realistic");
    let source = photo(3);

    let image = cache.get_or_create(&key, &source, None, None).await?;

    assert!(image.ptr_eq(&source));
    assert_eq!(generator.calls(), 0);
    assert!(cache.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unknown_style_is_config_error() {
    let generator = MockGenerator::new(Behavior::Image);
    let cache = cache_with(generator.clone());
    let key = AvatarCacheKey::new("Mia", ClothingCategory::Winter, "cubist");

    let err = cache
        .get_or_create(&key, &photo(1), None, None)
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), PicturebookErrorKind::Config(_)));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_clear_drops_everything() -> anyhow::Result<()> {
    let generator = MockGenerator::new(Behavior::Image);
    let cache = cache_with(generator.clone());
    let key = mia_winter();

    cache.get_or_create(&key, &photo(1), None, None).await?;
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.audit_log().len(), 1);

    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.audit_log().is_empty());

    cache.get_or_create(&key, &photo(1), None, None).await?;
    assert_eq!(generator.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_generation_running_across_clear_is_not_stored() -> anyhow::Result<()> {
    let generator = MockGenerator::slow(Behavior::Image, Duration::from_millis(80));
    let cache = cache_with(generator.clone());
    let key = mia_winter();

    let pending = {
        let cache = cache.clone();
        let key = key.clone();
        tokio::spawn(async move { cache.get_or_create(&key, &photo(1), None, None).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(cache.is_in_flight(&key));

    cache.clear();
    let image = pending.await??;

    assert!(!image.is_empty());
    assert!(!cache.is_cached(&key));
    assert!(!cache.is_in_flight(&key));
    assert!(cache.audit_log().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_abandoned_generation_is_resumed_by_next_caller() -> anyhow::Result<()> {
    let generator = MockGenerator::slow(Behavior::Image, Duration::from_millis(80));
    let cache = cache_with(generator.clone());
    let key = mia_winter();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        cache.get_or_create(&key, &photo(1), None, None),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(cache.is_in_flight(&key));

    let image = cache.get_or_create(&key, &photo(1), None, None).await?;

    assert_eq!(generator.calls(), 1);
    assert!(cache.is_cached(&key));
    assert!(image.ptr_eq(&cache.get(&key).expect("resumed generation cached")));
    Ok(())
}

#[tokio::test]
async fn test_request_after_clear_starts_fresh_generation() -> anyhow::Result<()> {
    let generator = MockGenerator::slow(Behavior::Image, Duration::from_millis(80));
    let cache = cache_with(generator.clone());
    let key = mia_winter();

    let pending = {
        let cache = cache.clone();
        let key = key.clone();
        tokio::spawn(async move { cache.get_or_create(&key, &photo(1), None, None).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.clear();

    let fresh = cache.get_or_create(&key, &photo(1), None, None).await?;
    let stale = pending.await??;

    assert_eq!(generator.calls(), 2);
    assert!(!stale.ptr_eq(&fresh));
    let stored = cache.get(&key).expect("fresh generation cached");
    assert!(stored.ptr_eq(&fresh));
    assert_eq!(cache.audit_log().len(), 1);
    Ok(())
}

fn roster() -> Vec<Character> {
    vec![
        Character::new("Mia", photo(1)).with_clothing_variant(ClothingCategory::Winter, photo(11)),
        Character::new("Leo", photo(2)),
    ]
}

fn requirements() -> AssetRequirements {
    let mut requirements = AssetRequirements::default();
    requirements.insert("Mia", ClothingCategory::Winter, SceneSlot::Page(1));
    requirements.insert("Mia", ClothingCategory::Standard, SceneSlot::Page(2));
    requirements.insert("Leo", ClothingCategory::Winter, SceneSlot::Page(1));
    requirements.insert("Grandpa", ClothingCategory::Winter, SceneSlot::Page(3));
    requirements
}

#[tokio::test]
async fn test_prepare_all_generates_missing_and_writes_back() -> anyhow::Result<()> {
    let generator = MockGenerator::slow(Behavior::Image, Duration::from_millis(10));
    let cache = cache_with(generator.clone());
    let mut roster = roster();

    // One key is already available from earlier in the job.
    let leo = AvatarCacheKey::new("Leo", ClothingCategory::Winter, "pixar");
    let leo_styled = cache.get_or_create(&leo, &photo(2), None, None).await?;
    assert_eq!(generator.calls(), 1);

    let report = cache.prepare_all(&mut roster, "pixar", &requirements()).await?;

    assert_eq!(report.requested, 4);
    assert_eq!(report.already_cached, 1);
    assert_eq!(report.styled, 2);
    assert_eq!(report.fallbacks, 0);
    assert_eq!(report.unknown_characters, vec!["Grandpa".to_string()]);
    assert!(!report.passthrough);
    assert_eq!(generator.calls(), 3);

    let mia = &roster[0];
    assert!(mia.styled_variant("pixar", ClothingCategory::Winter).is_some());
    assert!(mia.styled_variant("pixar", ClothingCategory::Standard).is_some());
    let leo_variant = roster[1]
        .styled_variant("pixar", ClothingCategory::Winter)
        .expect("cached avatar written back");
    assert!(leo_variant.ptr_eq(&leo_styled));
    Ok(())
}

#[tokio::test]
async fn test_prepare_all_never_writes_back_fallbacks() -> anyhow::Result<()> {
    let generator = MockGenerator::new(Behavior::Fail);
    let cache = cache_with(generator.clone());
    let mut roster = roster();

    let report = cache.prepare_all(&mut roster, "watercolor", &requirements()).await?;

    assert_eq!(report.fallbacks, 3);
    assert_eq!(report.styled, 0);
    assert!(cache.is_empty());
    for character in &roster {
        for clothing in [ClothingCategory::Winter, ClothingCategory::Standard] {
            assert!(character.styled_variant("watercolor", clothing).is_none());
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_prepare_all_skips_passthrough_style() -> anyhow::Result<()> {
    let generator = MockGenerator::new(Behavior::Image);
    let cache = cache_with(generator.clone());
    let mut roster = roster();

    let report = cache.prepare_all(&mut roster, "realistic", &requirements()).await?;

    assert!(report.passthrough);
    assert_eq!(report.requested, 4);
    assert_eq!(generator.calls(), 0);
    assert!(cache.is_empty());
    Ok(())
}
