//! Style conversion with a quality gate and bounded retries.
//!
//! One [`StyleConverter::convert`] call runs the whole generation procedure for
//! a single cache key:
//!
//! 1. Build a conversion request from the style prompt, the reference images
//!    and the outfit description
//! 2. Call the image generator and downscale whatever it returns
//! 3. Score the candidate against the identity photo, when there is one
//! 4. Retry below-threshold or missing results until attempts run out
//!
//! The caller always gets an image back. When no attempt produced anything
//! usable, that image is the unstyled source.

use crate::{
    AttemptOutcome, AvatarSettings, Disposition, GenerationAudit, ResolvedStyle,
    prepare_for_storage,
};
use derive_getters::Getters;
use parking_lot::Mutex;
use picturebook_core::{AvatarCacheKey, ImageData};
use picturebook_error::{BuilderError, GenerationError, GenerationErrorKind};
use picturebook_interface::{
    ImageGenerator, QualityGate, QualityScores, ReferenceImage, ReferenceRole,
    StyleConversionRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, info, instrument, warn};

/// Everything needed to style one avatar.
#[derive(Debug, Clone, Getters)]
pub struct ConversionJob {
    key: AvatarCacheKey,
    style: ResolvedStyle,
    source: ImageData,
    identity: Option<ImageData>,
    clothing_description: Option<String>,
}

impl ConversionJob {
    /// Create a job for a key, style and body/clothing reference.
    pub fn new(key: AvatarCacheKey, style: ResolvedStyle, source: ImageData) -> Self {
        Self {
            key,
            style,
            source,
            identity: None,
            clothing_description: None,
        }
    }

    /// Attach the face photo. Ignored when it is the source image itself.
    pub fn with_identity(mut self, identity: Option<ImageData>) -> Self {
        self.identity = identity.filter(|photo| !photo.same_content(&self.source));
        self
    }

    /// Attach an explicit outfit description.
    pub fn with_clothing_description(mut self, description: Option<String>) -> Self {
        self.clothing_description = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        self
    }
}

/// The image a conversion settled on, with its audit trail.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Styled image, or the unstyled source when nothing usable was generated
    pub image: ImageData,
    /// How the image was arrived at
    pub disposition: Disposition,
    /// Per-attempt history
    pub audit: GenerationAudit,
}

/// A candidate that ended the retry loop.
struct Settled {
    image: ImageData,
    shortfall: Option<QualityScores>,
}

/// Mutable state shared by the attempts of one conversion.
struct RunState {
    attempt: u32,
    best_rejected: Option<(QualityScores, ImageData)>,
    audit: GenerationAudit,
}

impl RunState {
    fn keep_if_better(&mut self, scores: QualityScores, candidate: ImageData) {
        let better = self
            .best_rejected
            .as_ref()
            .is_none_or(|(best, _)| scores.total() > best.total());
        if better {
            self.best_rejected = Some((scores, candidate));
        }
    }
}

/// Drives the image generator and quality gate for single avatars.
pub struct StyleConverter {
    generator: Arc<dyn ImageGenerator>,
    gate: Option<Arc<dyn QualityGate>>,
    settings: AvatarSettings,
}

impl std::fmt::Debug for StyleConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleConverter")
            .field("provider", &self.generator.provider_name())
            .field("quality_gate", &self.gate.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl StyleConverter {
    /// Create a converter without a quality gate.
    pub fn new(generator: Arc<dyn ImageGenerator>, settings: AvatarSettings) -> Self {
        Self {
            generator,
            gate: None,
            settings,
        }
    }

    /// Score candidates with a quality gate.
    pub fn with_quality_gate(mut self, gate: Arc<dyn QualityGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Settings in effect.
    pub fn settings(&self) -> &AvatarSettings {
        &self.settings
    }

    /// Run the generation procedure for one avatar.
    ///
    /// Never fails: generator and gate errors are retried, logged and recorded
    /// in the returned audit.
    #[instrument(skip_all, fields(key = %job.key, provider = self.generator.provider_name()))]
    pub async fn convert(&self, job: &ConversionJob) -> Conversion {
        let max_attempts = (*self.settings.max_attempts()).max(1);
        let run = Mutex::new(RunState {
            attempt: 0,
            best_rejected: None,
            audit: GenerationAudit::start(job.key.clone(), self.generator.provider_name()),
        });

        let backoff_ms = *self.settings.retry_backoff_ms();
        let strategy = ExponentialBackoff::from_millis(backoff_ms)
            .factor(2)
            .max_delay(Duration::from_millis(backoff_ms.saturating_mul(8)))
            .map(jitter)
            .take(max_attempts as usize - 1);

        let settled = Retry::spawn(strategy, || self.attempt(job, &run, max_attempts)).await;
        let RunState {
            best_rejected,
            audit,
            ..
        } = run.into_inner();

        match settled {
            Ok(Settled {
                image,
                shortfall: None,
            }) => {
                info!(attempts = audit.attempt_count(), "Avatar styled");
                Conversion {
                    image,
                    disposition: Disposition::Styled,
                    audit: audit.finish(Disposition::Styled, None),
                }
            }
            Ok(Settled {
                image,
                shortfall: Some(scores),
            }) => Conversion {
                image,
                disposition: Disposition::BestEffort,
                audit: audit.finish(Disposition::BestEffort, Some(scores)),
            },
            Err(e) => match best_rejected {
                Some((scores, image)) => {
                    warn!(error = %e, face = scores.face, "Attempts exhausted, keeping best rejected candidate");
                    Conversion {
                        image,
                        disposition: Disposition::BestEffort,
                        audit: audit.finish(Disposition::BestEffort, Some(scores)),
                    }
                }
                None => {
                    warn!(error = %e, "Attempts exhausted, using unstyled source image");
                    Conversion {
                        image: job.source.clone(),
                        disposition: Disposition::Unstyled,
                        audit: audit.finish(Disposition::Unstyled, None),
                    }
                }
            },
        }
    }

    /// One pass through request, generation, downscaling and scoring.
    async fn attempt(
        &self,
        job: &ConversionJob,
        run: &Mutex<RunState>,
        max_attempts: u32,
    ) -> Result<Settled, RetryError<GenerationError>> {
        let attempt = {
            let mut run = run.lock();
            run.attempt += 1;
            run.attempt
        };
        let request = self.request(job, attempt).map_err(RetryError::Permanent)?;
        debug!(attempt, max_attempts, references = request.references().len(), "Requesting styled avatar");

        let generated = match self.generator.generate(&request).await {
            Ok(Some(image)) => image,
            Ok(None) => {
                warn!(attempt, "Generator returned no image");
                run.lock().audit.record(attempt, AttemptOutcome::NoImage);
                return Err(transient(GenerationErrorKind::NoImage));
            }
            Err(e) => {
                warn!(attempt, error = %e, "Generation failed");
                run.lock().audit.record(
                    attempt,
                    AttemptOutcome::Failed {
                        error: e.to_string(),
                    },
                );
                return Err(transient(GenerationErrorKind::Capability(e.to_string())));
            }
        };
        let candidate = prepare_for_storage(&generated, &self.settings);

        let (Some(gate), Some(identity)) = (&self.gate, &job.identity) else {
            run.lock()
                .audit
                .record(attempt, AttemptOutcome::Accepted { scores: None });
            return Ok(Settled {
                image: candidate,
                shortfall: None,
            });
        };

        let scores = match self
            .evaluate(gate.as_ref(), identity, &candidate, job.clothing_description.as_deref())
            .await
        {
            Ok(scores) => scores,
            Err(e) => {
                warn!(attempt, error = %e, "Quality gate unavailable, accepting candidate");
                run.lock().audit.record(
                    attempt,
                    AttemptOutcome::GateUnavailable {
                        error: e.to_string(),
                    },
                );
                return Ok(Settled {
                    image: candidate,
                    shortfall: None,
                });
            }
        };

        let min_face = *self.settings.min_face_score();
        let min_clothing = *self.settings.min_clothing_score();
        if scores.passes(min_face, min_clothing) {
            debug!(attempt, face = scores.face, clothing = ?scores.clothing, "Candidate passed quality gate");
            run.lock()
                .audit
                .record(attempt, AttemptOutcome::Accepted { scores: Some(scores) });
            return Ok(Settled {
                image: candidate,
                shortfall: None,
            });
        }

        if attempt >= max_attempts {
            warn!(
                attempt,
                face = scores.face,
                clothing = ?scores.clothing,
                "Final attempt below threshold, accepting with shortfall"
            );
            run.lock()
                .audit
                .record(attempt, AttemptOutcome::AcceptedWithShortfall { scores });
            return Ok(Settled {
                image: candidate,
                shortfall: Some(scores),
            });
        }

        warn!(
            attempt,
            face = scores.face,
            clothing = ?scores.clothing,
            "Candidate below threshold, retrying"
        );
        let mut run = run.lock();
        run.audit.record(attempt, AttemptOutcome::Rejected { scores });
        run.keep_if_better(scores, candidate);
        Err(transient(GenerationErrorKind::Shortfall {
            face: scores.face,
            clothing: scores.clothing,
        }))
    }

    /// Ask the gate for scores and check they are on the 0-10 scale.
    async fn evaluate(
        &self,
        gate: &dyn QualityGate,
        identity: &ImageData,
        candidate: &ImageData,
        clothing_description: Option<&str>,
    ) -> Result<QualityScores, GenerationError> {
        let mut scores = gate
            .evaluate(identity, candidate, clothing_description)
            .await
            .map_err(|e| GenerationError::new(GenerationErrorKind::QualityGate(e.to_string())))?;

        if let Some(score) = std::iter::once(scores.face)
            .chain(scores.clothing)
            .find(|score| *score > QualityScores::MAX)
        {
            return Err(GenerationError::new(GenerationErrorKind::ScoreOutOfRange(score)));
        }
        if clothing_description.is_none() {
            scores.clothing = None;
        }
        Ok(scores)
    }

    /// Assemble the conversion request for an attempt.
    fn request(
        &self,
        job: &ConversionJob,
        attempt: u32,
    ) -> Result<StyleConversionRequest, GenerationError> {
        let mut references = Vec::with_capacity(3);
        if let Some(identity) = &job.identity {
            references.push(ReferenceImage {
                role: ReferenceRole::Identity,
                image: identity.clone(),
            });
        }
        references.push(ReferenceImage {
            role: ReferenceRole::Body,
            image: job.source.clone(),
        });
        if let Some(exemplar) = job.style.exemplar() {
            references.push(ReferenceImage {
                role: ReferenceRole::StyleExemplar,
                image: exemplar.clone(),
            });
        }

        let prompt = match &job.clothing_description {
            Some(outfit) => format!("{}\n\nOutfit: {}", job.style.prompt(), outfit),
            None => job.style.prompt().clone(),
        };

        StyleConversionRequest::builder()
            .prompt(prompt)
            .references(references)
            .clothing_description(job.clothing_description.clone())
            .attempt(attempt)
            .build()
            .map_err(|e| GenerationError::from(BuilderError::from(e)))
    }
}

fn transient(kind: GenerationErrorKind) -> RetryError<GenerationError> {
    RetryError::Transient {
        err: GenerationError::new(kind),
        retry_after: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use picturebook_core::ClothingCategory;
    use picturebook_error::PicturebookResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fresh image per call and remembers every request.
    #[derive(Default)]
    struct RecordingGenerator {
        requests: Mutex<Vec<StyleConversionRequest>>,
    }

    #[async_trait]
    impl ImageGenerator for RecordingGenerator {
        async fn generate(
            &self,
            request: &StyleConversionRequest,
        ) -> PicturebookResult<Option<ImageData>> {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            Ok(Some(ImageData::new(
                vec![requests.len() as u8; 4],
                "application/octet-stream",
            )))
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    /// Scores from a fixed sequence, repeating the last entry.
    struct ScriptedGate {
        scores: Vec<QualityScores>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QualityGate for ScriptedGate {
        async fn evaluate(
            &self,
            _identity: &ImageData,
            _candidate: &ImageData,
            _expected_clothing: Option<&str>,
        ) -> PicturebookResult<QualityScores> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.scores[call.min(self.scores.len() - 1)])
        }
    }

    fn settings(max_attempts: u32) -> AvatarSettings {
        AvatarSettings::default()
            .with_max_attempts(max_attempts)
            .with_retry_backoff_ms(0)
    }

    fn job() -> ConversionJob {
        let key = AvatarCacheKey::new("Mia", ClothingCategory::Winter, "pixar");
        let style = ResolvedStyle::new("pixar", "3D animated look")
            .with_exemplar(ImageData::new(vec![9; 4], "image/png"));
        ConversionJob::new(key, style, ImageData::new(vec![1; 4], "image/png"))
            .with_identity(Some(ImageData::new(vec![2; 4], "image/png")))
            .with_clothing_description(Some("red wool coat".to_string()))
    }

    #[tokio::test]
    async fn test_request_carries_all_references() {
        let generator = Arc::new(RecordingGenerator::default());
        let converter = StyleConverter::new(generator.clone(), settings(2));

        let conversion = converter.convert(&job()).await;
        assert_eq!(conversion.disposition, Disposition::Styled);

        let requests = generator.requests.lock();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        let roles: Vec<ReferenceRole> = request.references().iter().map(|r| r.role).collect();
        assert_eq!(
            roles,
            vec![
                ReferenceRole::Identity,
                ReferenceRole::Body,
                ReferenceRole::StyleExemplar
            ]
        );
        assert!(request.prompt().contains("3D animated look"));
        assert!(request.prompt().contains("red wool coat"));
        assert_eq!(request.clothing_description().as_deref(), Some("red wool coat"));
    }

    #[test]
    fn test_identity_equal_to_source_is_dropped() {
        let source = ImageData::new(vec![1; 4], "image/png");
        let job = ConversionJob::new(
            AvatarCacheKey::new("Leo", ClothingCategory::Standard, "comic"),
            ResolvedStyle::new("comic", "ink"),
            source.clone(),
        )
        .with_identity(Some(source));
        assert!(job.identity().is_none());
    }

    #[tokio::test]
    async fn test_retry_then_accept() {
        let generator = Arc::new(RecordingGenerator::default());
        let gate = Arc::new(ScriptedGate {
            scores: vec![QualityScores::new(2, Some(9)), QualityScores::new(8, Some(7))],
            calls: AtomicUsize::new(0),
        });
        let converter = StyleConverter::new(generator.clone(), settings(3)).with_quality_gate(gate);

        let conversion = converter.convert(&job()).await;

        assert_eq!(conversion.disposition, Disposition::Styled);
        assert_eq!(conversion.image.bytes(), &[2, 2, 2, 2]);
        assert_eq!(conversion.audit.attempt_count(), 2);
        let attempts: Vec<u32> = generator.requests.lock().iter().map(|r| *r.attempt()).collect();
        assert_eq!(attempts, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_final_attempt_accepted_with_shortfall() {
        let generator = Arc::new(RecordingGenerator::default());
        let gate = Arc::new(ScriptedGate {
            scores: vec![QualityScores::new(6, Some(3)), QualityScores::new(1, Some(1))],
            calls: AtomicUsize::new(0),
        });
        let converter = StyleConverter::new(generator.clone(), settings(2)).with_quality_gate(gate);

        let conversion = converter.convert(&job()).await;

        assert_eq!(conversion.disposition, Disposition::BestEffort);
        // The last attempt wins even though the first scored higher.
        assert_eq!(conversion.image.bytes(), &[2, 2, 2, 2]);
        assert_eq!(
            *conversion.audit.shortfall(),
            Some(QualityScores::new(1, Some(1)))
        );
    }

    #[tokio::test]
    async fn test_out_of_range_score_skips_gate() {
        let generator = Arc::new(RecordingGenerator::default());
        let gate = Arc::new(ScriptedGate {
            scores: vec![QualityScores {
                face: 42,
                clothing: None,
            }],
            calls: AtomicUsize::new(0),
        });
        let converter = StyleConverter::new(generator.clone(), settings(2)).with_quality_gate(gate);

        let conversion = converter.convert(&job()).await;

        assert_eq!(conversion.disposition, Disposition::Styled);
        assert_eq!(generator.requests.lock().len(), 1);
        assert!(matches!(
            conversion.audit.attempts()[0].outcome(),
            AttemptOutcome::GateUnavailable { .. }
        ));
    }
}
