//! Character record error types.

/// Problems normalizing an ingested character record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CharacterErrorKind {
    /// The record has no usable reference image in any known field
    #[display("Character '{}' has no reference image", _0)]
    MissingReferenceImage(String),
    /// The record has an empty name
    #[display("Character record has an empty name")]
    EmptyName,
    /// Two characters in one roster share a name
    #[display("Duplicate character name '{}'", _0)]
    DuplicateName(String),
    /// The record does not match any known shape
    #[display("Unrecognized character record: {}", _0)]
    UnknownShape(String),
}

/// Character error with location tracking.
///
/// # Examples
///
/// ```
/// use picturebook_error::{CharacterError, CharacterErrorKind};
///
/// let err = CharacterError::new(CharacterErrorKind::MissingReferenceImage("Mia".to_string()));
/// assert!(format!("{}", err).contains("Mia"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Character Error: {} at line {} in {}", kind, line, file)]
pub struct CharacterError {
    /// The kind of error that occurred
    pub kind: CharacterErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CharacterError {
    /// Create a new character error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CharacterErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
