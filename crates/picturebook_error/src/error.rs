//! Top-level error wrapper types.

use crate::{
    BuilderError, CharacterError, ConfigError, GenerationError, ImageError, JsonError,
    OutlineError,
};

/// The foundation error enum covering every crate in the workspace.
///
/// # Examples
///
/// ```
/// use picturebook_error::{ConfigError, ConfigErrorKind, PicturebookError};
///
/// let config_err = ConfigError::new(ConfigErrorKind::EmptyCatalog);
/// let err: PicturebookError = config_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum PicturebookErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Request construction error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Image payload error
    #[from(ImageError)]
    Image(ImageError),
    /// External generation capability error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Outline validation error
    #[from(OutlineError)]
    Outline(OutlineError),
    /// Character record error
    #[from(CharacterError)]
    Character(CharacterError),
}

/// Picturebook error with kind discrimination.
///
/// # Examples
///
/// ```
/// use picturebook_error::{JsonError, PicturebookResult};
///
/// fn might_fail() -> PicturebookResult<()> {
///     Err(JsonError::new("Roster is not an array"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Picturebook Error: {}", _0)]
pub struct PicturebookError(Box<PicturebookErrorKind>);

impl PicturebookError {
    /// Create a new error from a kind.
    pub fn new(kind: PicturebookErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PicturebookErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to PicturebookErrorKind
impl<T> From<T> for PicturebookError
where
    T: Into<PicturebookErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Picturebook operations.
pub type PicturebookResult<T> = std::result::Result<T, PicturebookError>;
