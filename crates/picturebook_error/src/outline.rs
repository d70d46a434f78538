//! Outline validation error types.

/// Structural problems found when validating an outline.
///
/// Parsing itself never fails; these are only produced by explicit validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum OutlineErrorKind {
    /// A page header appears after a header with a higher page number
    #[display("Page {} appears after page {} (line {})", page, previous, line_index)]
    OutOfOrder {
        /// Page number of the offending header
        page: u32,
        /// Page number of the header before it
        previous: u32,
        /// Zero-based line index of the offending header
        line_index: usize,
    },
    /// The same page number has more than one header
    #[display("Page {} has more than one header", _0)]
    Duplicate(u32),
    /// The outline contains no page headers at all
    #[display("Outline contains no page headers")]
    NoPages,
}

/// Outline error with location tracking.
///
/// # Examples
///
/// ```
/// use picturebook_error::{OutlineError, OutlineErrorKind};
///
/// let err = OutlineError::new(OutlineErrorKind::Duplicate(4));
/// assert!(format!("{}", err).contains("Page 4"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Outline Error: {} at line {} in {}", kind, line, file)]
pub struct OutlineError {
    /// The specific error condition
    pub kind: OutlineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl OutlineError {
    /// Create a new OutlineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: OutlineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
