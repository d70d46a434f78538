//! Errors from assembling requests to the external capabilities.

/// Why a request could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A required request field was never set
    #[display("{} is missing required field '{}'", request, field)]
    MissingField {
        /// Request type being built
        request: &'static str,
        /// Field name
        field: &'static str,
    },
    /// The builder's own validation rejected the values
    #[display("{} failed validation: {}", request, reason)]
    Invalid {
        /// Request type being built
        request: &'static str,
        /// Validation message
        reason: String,
    },
}

/// Request construction error with location tracking.
///
/// A request that cannot be built will not build on the next attempt either,
/// so generation treats this as permanent.
///
/// # Examples
///
/// ```
/// use picturebook_error::{BuilderError, BuilderErrorKind};
///
/// let err = BuilderError::new(BuilderErrorKind::MissingField {
///     request: "StyleConversionRequest",
///     field: "prompt",
/// });
/// assert!(err.to_string().contains("missing required field 'prompt'"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    kind: BuilderErrorKind,
    line: u32,
    file: &'static str,
}

impl BuilderError {
    /// Create a new builder error with caller location tracking.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BuilderErrorKind {
        &self.kind
    }
}
