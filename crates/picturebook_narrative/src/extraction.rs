//! Locating structured blocks embedded in model output.
//!
//! Scene descriptions may carry one fenced JSON block next to the prose.
//! The block is found by fence position so callers can both parse it and
//! cut it out of the text without touching anything else.

use picturebook_error::{JsonError, PicturebookResult};

/// A fenced code block located in a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    /// Byte offset of the opening fence
    pub start: usize,
    /// Byte offset just past the closing fence (or end of text if unterminated)
    pub end: usize,
    /// Trimmed content between the fences
    pub content: &'a str,
}

const FENCE: &str = "```";

/// Find the first fenced block holding JSON.
///
/// A fence tagged `json` is preferred. Otherwise the first untagged fence whose
/// content starts with `{` is used. An unterminated fence runs to the end of
/// the text, which is how truncated model output usually looks.
///
/// # Examples
///
/// ```
/// use picturebook_narrative::find_code_block;
///
/// let text = "Mia builds a snowman.\n\n```json\n{\"characters\": [\"Mia\"]}\n```\n";
/// let block = find_code_block(text).unwrap();
/// assert_eq!(block.content, "{\"characters\": [\"Mia\"]}");
/// assert_eq!(&text[..block.start], "Mia builds a snowman.\n\n");
/// ```
pub fn find_code_block(text: &str) -> Option<CodeBlock<'_>> {
    let mut untagged = None;
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find(FENCE) {
        let start = search_from + offset;
        let after_fence = start + FENCE.len();
        let info_end = text[after_fence..]
            .find('\n')
            .map(|n| after_fence + n)
            .unwrap_or(text.len());
        let info = text[after_fence..info_end].trim().to_lowercase();
        let content_start = (info_end + 1).min(text.len());

        let (content_end, end) = match text[content_start..].find(FENCE) {
            Some(n) => (content_start + n, content_start + n + FENCE.len()),
            None => (text.len(), text.len()),
        };
        let block = CodeBlock {
            start,
            end,
            content: text[content_start..content_end].trim(),
        };

        if info == "json" {
            return Some(block);
        }
        if info.is_empty() && untagged.is_none() && block.content.starts_with('{') {
            untagged = Some(block);
        }
        if end >= text.len() {
            break;
        }
        search_from = end;
    }

    untagged
}

/// Parse JSON into a specific type.
///
/// # Errors
///
/// Returns a [`JsonError`] carrying a short preview of the input when parsing fails.
pub fn parse_json<T>(json: &str) -> PicturebookResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(json).map_err(|e| {
        let err = JsonError::parse(e, json);
        tracing::debug!(error = %err.message, json_preview = ?err.input_preview, "Scene block is not valid JSON");
        err.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_json_tag() {
        let text = "```\n{\"a\": 1}\n```\n\n```json\n{\"b\": 2}\n```";
        let block = find_code_block(text).unwrap();
        assert_eq!(block.content, "{\"b\": 2}");
    }

    #[test]
    fn test_untagged_object_fence() {
        let text = "Scene.\n```\n{\"characters\": []}\n```\nMore prose.";
        let block = find_code_block(text).unwrap();
        assert!(block.content.starts_with('{'));
        assert_eq!(&text[block.end..], "\nMore prose.");
    }

    #[test]
    fn test_ignores_other_languages() {
        let text = "```toml\n[scene]\n```\n```python\nprint(1)\n```";
        assert!(find_code_block(text).is_none());
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let text = "Intro\n```json\n{\"characters\": [\"Leo\"";
        let block = find_code_block(text).unwrap();
        assert_eq!(block.end, text.len());
        assert!(block.content.contains("Leo"));
    }

    #[test]
    fn test_parse_json_error_has_preview() {
        let result: PicturebookResult<serde_json::Value> = parse_json("{not json");
        let err = result.unwrap_err();
        match err.kind() {
            picturebook_error::PicturebookErrorKind::Json(json_err) => {
                assert_eq!(json_err.input_preview.as_deref(), Some("{not json"));
            }
            other => panic!("expected a JSON error, got {other}"),
        }
    }
}
