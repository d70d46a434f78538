//! Request and score types exchanged with the capabilities.

use derive_getters::Getters;
use picturebook_core::ImageData;
use picturebook_error::{BuilderError, BuilderErrorKind};
use serde::{Deserialize, Serialize};

/// What a reference image in a conversion request stands for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceRole {
    /// Face photo the result must resemble
    Identity,
    /// Body and outfit reference
    Body,
    /// Example of the target art style
    StyleExemplar,
}

/// A reference image with its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    /// Role of the image in the request
    pub role: ReferenceRole,
    /// The image itself
    pub image: ImageData,
}

/// A request to re-render a character reference in a target art style.
///
/// # Examples
///
/// ```
/// use picturebook_core::ImageData;
/// use picturebook_interface::{ReferenceImage, ReferenceRole, StyleConversionRequest};
///
/// let body = ImageData::new(vec![1, 2, 3], "image/png");
/// let request = StyleConversionRequest::builder()
///     .prompt("Soft 3D animated style")
///     .references(vec![ReferenceImage { role: ReferenceRole::Body, image: body }])
///     .build()
///     .unwrap();
///
/// assert_eq!(request.references().len(), 1);
/// assert!(request.image_for(ReferenceRole::Identity).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct StyleConversionRequest {
    /// Full prompt text
    prompt: String,
    /// Reference images in the order they should be presented to the model
    #[builder(default)]
    references: Vec<ReferenceImage>,
    /// Explicit outfit description, when known
    #[builder(default)]
    clothing_description: Option<String>,
    /// Which attempt this request belongs to (1-based)
    #[builder(default = "1")]
    attempt: u32,
}

impl StyleConversionRequest {
    /// Creates a new request builder.
    pub fn builder() -> StyleConversionRequestBuilder {
        StyleConversionRequestBuilder::default()
    }

    /// First reference image with the given role.
    pub fn image_for(&self, role: ReferenceRole) -> Option<&ImageData> {
        self.references
            .iter()
            .find(|reference| reference.role == role)
            .map(|reference| &reference.image)
    }
}

impl From<StyleConversionRequestBuilderError> for BuilderError {
    #[track_caller]
    fn from(err: StyleConversionRequestBuilderError) -> Self {
        let request = "StyleConversionRequest";
        match err {
            StyleConversionRequestBuilderError::UninitializedField(field) => {
                BuilderError::new(BuilderErrorKind::MissingField { request, field })
            }
            StyleConversionRequestBuilderError::ValidationError(reason) => {
                BuilderError::new(BuilderErrorKind::Invalid { request, reason })
            }
        }
    }
}

/// Scores returned by the quality gate on a fixed 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScores {
    /// How closely the face matches the identity photo
    pub face: u8,
    /// How closely the outfit matches the description, when one was given
    pub clothing: Option<u8>,
}

impl QualityScores {
    /// Upper bound of the scoring scale.
    pub const MAX: u8 = 10;

    /// Scores clamped to the 0-10 scale.
    pub fn new(face: u8, clothing: Option<u8>) -> Self {
        Self {
            face: face.min(Self::MAX),
            clothing: clothing.map(|score| score.min(Self::MAX)),
        }
    }

    /// Whether both scores meet their minimums. A missing clothing score passes.
    pub fn passes(&self, min_face: u8, min_clothing: u8) -> bool {
        self.face >= min_face && self.clothing.is_none_or(|score| score >= min_clothing)
    }

    /// Sum of available scores, used to rank rejected candidates.
    pub fn total(&self) -> u16 {
        u16::from(self.face) + u16::from(self.clothing.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_clamped() {
        let scores = QualityScores::new(14, Some(11));
        assert_eq!(scores.face, 10);
        assert_eq!(scores.clothing, Some(10));
    }

    #[test]
    fn test_passes_requires_both_scores() {
        assert!(QualityScores::new(5, Some(5)).passes(5, 5));
        assert!(!QualityScores::new(4, Some(9)).passes(5, 5));
        assert!(!QualityScores::new(9, Some(4)).passes(5, 5));
        assert!(QualityScores::new(6, None).passes(5, 5));
    }

    #[test]
    fn test_builder_defaults_attempt() {
        let request = StyleConversionRequest::builder()
            .prompt("watercolor")
            .build()
            .unwrap();
        assert_eq!(*request.attempt(), 1);
        assert!(request.clothing_description().is_none());
    }

    #[test]
    fn test_missing_prompt_names_the_field() {
        let err = BuilderError::from(StyleConversionRequest::builder().attempt(2u32).build().unwrap_err());
        assert_eq!(
            err.kind(),
            &BuilderErrorKind::MissingField {
                request: "StyleConversionRequest",
                field: "prompt",
            }
        );
    }
}
