//! Configuration error types.

/// What is wrong with the style catalog or avatar settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConfigErrorKind {
    /// A configuration source could not be read or deserialized
    #[display("Failed to load configuration from {}: {}", origin, reason)]
    Load {
        /// File path, or "bundled defaults"
        origin: String,
        /// Underlying loader message
        reason: String,
    },
    /// An `[avatar]` value is outside its allowed range
    #[display("avatar.{} {}", field, reason)]
    InvalidSetting {
        /// Setting name within `[avatar]`
        field: &'static str,
        /// Allowed range and the offending value
        reason: String,
    },
    /// No `[styles.*]` tables were configured
    #[display("Style catalog is empty")]
    EmptyCatalog,
    /// A style table has a blank id
    #[display("Style ids must not be blank")]
    BlankStyleId,
    /// A style has no prompt text
    #[display("Style '{}' has an empty prompt", _0)]
    EmptyPrompt(String),
    /// A style's exemplar image could not be read
    #[display("Style '{}' exemplar {} could not be read: {}", style, path, reason)]
    MissingExemplar {
        /// Style id
        style: String,
        /// Resolved exemplar path
        path: String,
        /// I/O error message
        reason: String,
    },
    /// A job asked for a style the catalog does not define
    #[display("Unknown art style '{}' (known: {})", id, known)]
    UnknownStyle {
        /// Requested id
        id: String,
        /// Comma-separated known ids
        known: String,
    },
}

/// Configuration error with source location.
///
/// This is the one error class that should stop a process at startup.
///
/// # Examples
///
/// ```
/// use picturebook_error::{ConfigError, ConfigErrorKind};
///
/// let err = ConfigError::new(ConfigErrorKind::EmptyPrompt("pixar".to_string()));
/// assert!(err.to_string().contains("'pixar' has an empty prompt"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    /// The specific error condition
    pub kind: ConfigErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError at the current location.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }
}
