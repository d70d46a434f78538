//! Image-generation capability error types.

use crate::{BuilderError, BuilderErrorKind};

/// Specific failure conditions of the external generation capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// The image-generation call failed or timed out
    #[display("Image generation failed: {}", _0)]
    Capability(String),
    /// The image-generation call succeeded but returned no image payload
    #[display("Image generation returned no image")]
    NoImage,
    /// The quality-gate evaluation call failed
    #[display("Quality gate evaluation failed: {}", _0)]
    QualityGate(String),
    /// A candidate scored below the acceptance thresholds
    #[display("Quality shortfall: face {}, clothing {:?}", face, clothing)]
    Shortfall {
        /// Face-match score
        face: u8,
        /// Clothing-match score, when clothing was checked
        clothing: Option<u8>,
    },
    /// A score outside the 0-10 scale was reported
    #[display("Quality score {} is outside the 0-10 scale", _0)]
    ScoreOutOfRange(u8),
    /// The conversion request itself could not be assembled
    #[display("Conversion request could not be built: {}", _0)]
    InvalidRequest(BuilderErrorKind),
}

impl GenerationErrorKind {
    /// Check if another attempt may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationErrorKind::Capability(_)
                | GenerationErrorKind::NoImage
                | GenerationErrorKind::Shortfall { .. }
        )
    }
}

/// Generation error with source location tracking.
///
/// # Examples
///
/// ```
/// use picturebook_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::NoImage);
/// assert!(format!("{}", err).contains("no image"));
/// assert!(err.kind.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<BuilderError> for GenerationError {
    #[track_caller]
    fn from(err: BuilderError) -> Self {
        Self::new(GenerationErrorKind::InvalidRequest(err.kind().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_are_permanent() {
        let err = GenerationError::from(BuilderError::new(BuilderErrorKind::MissingField {
            request: "StyleConversionRequest",
            field: "prompt",
        }));
        assert!(!err.kind.is_retryable());
        assert!(err.to_string().contains("missing required field 'prompt'"));
    }

    #[test]
    fn test_shortfall_is_retryable() {
        let kind = GenerationErrorKind::Shortfall {
            face: 3,
            clothing: Some(8),
        };
        assert!(kind.is_retryable());
        assert!(!GenerationErrorKind::ScoreOutOfRange(12).is_retryable());
    }
}
