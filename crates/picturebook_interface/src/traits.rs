//! Trait definitions for the external generation capabilities.

use crate::{QualityScores, StyleConversionRequest};
use async_trait::async_trait;
use picturebook_core::ImageData;
use picturebook_error::PicturebookResult;

/// Image-generation backend.
///
/// Treated as unreliable and expensive: a call may fail, or succeed without
/// returning an image (`Ok(None)`).
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render an image from a prompt and its reference images.
    async fn generate(&self, request: &StyleConversionRequest)
    -> PicturebookResult<Option<ImageData>>;

    /// Provider name used in logs (e.g., "gemini").
    fn provider_name(&self) -> &'static str;
}

/// Automated identity and clothing check for generated avatars.
#[async_trait]
pub trait QualityGate: Send + Sync {
    /// Score `candidate` against `identity`, and against `expected_clothing` when given.
    async fn evaluate(
        &self,
        identity: &ImageData,
        candidate: &ImageData,
        expected_clothing: Option<&str>,
    ) -> PicturebookResult<QualityScores>;
}
