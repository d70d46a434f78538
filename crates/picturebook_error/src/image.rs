//! Image payload error types.

/// Kinds of image handling errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ImageErrorKind {
    /// Image bytes could not be decoded
    #[display("Failed to decode image: {}", _0)]
    Decode(String),
    /// Image could not be re-encoded
    #[display("Failed to encode image: {}", _0)]
    Encode(String),
    /// A data URI or base64 payload was malformed
    #[display("Invalid image data: {}", _0)]
    InvalidData(String),
    /// An image file could not be read
    #[display("Failed to read image file: {}", _0)]
    FileRead(String),
}

/// Image error with location tracking.
///
/// # Examples
///
/// ```
/// use picturebook_error::{ImageError, ImageErrorKind};
///
/// let err = ImageError::new(ImageErrorKind::InvalidData("missing base64 marker".to_string()));
/// assert!(format!("{}", err).contains("Invalid image data"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Image Error: {} at line {} in {}", kind, line, file)]
pub struct ImageError {
    /// The kind of error that occurred
    pub kind: ImageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ImageError {
    /// Create a new image error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ImageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
