//! JSON error types.

const PREVIEW_CHARS: usize = 100;

/// A JSON document (roster, scene block, CLI input) that failed to parse or render.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: {}{} at line {} in {}", message, preview_suffix(input_preview), line, file)]
pub struct JsonError {
    /// serde_json's message
    pub message: String,
    /// The first characters of the offending input, when known
    pub input_preview: Option<String>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

fn preview_suffix(preview: &Option<String>) -> String {
    preview
        .as_deref()
        .map(|p| format!(" (input: {}...)", p))
        .unwrap_or_default()
}

impl JsonError {
    /// Create a new JsonError at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            input_preview: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Error for input that did not parse, keeping a short preview of the input.
    ///
    /// # Examples
    ///
    /// ```
    /// use picturebook_error::JsonError;
    ///
    /// let input = "{\"characters\": [\"Mia\",";
    /// let err = JsonError::parse(serde_json::from_str::<serde_json::Value>(input).unwrap_err(), input);
    /// assert_eq!(err.input_preview.as_deref(), Some(input));
    /// assert!(err.to_string().contains("(input: {\"characters\""));
    /// ```
    #[track_caller]
    pub fn parse(error: serde_json::Error, input: &str) -> Self {
        let mut err = Self::new(error.to_string());
        err.input_preview = Some(input.chars().take(PREVIEW_CHARS).collect());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_is_truncated() {
        let input = format!("[{}", "1,".repeat(200));
        let error = serde_json::from_str::<Vec<u32>>(&input).unwrap_err();
        let err = JsonError::parse(error, &input);
        assert_eq!(err.input_preview.as_ref().map(|p| p.chars().count()), Some(PREVIEW_CHARS));
    }

    #[test]
    fn test_plain_message_has_no_preview() {
        let err = JsonError::new("unsupported value");
        assert!(err.input_preview.is_none());
        assert!(!err.to_string().contains("(input:"));
    }
}
