//! Resolved art styles ready for generation requests.

use crate::PicturebookConfig;
use derive_getters::Getters;
use picturebook_core::ImageData;
use picturebook_error::{ConfigError, ConfigErrorKind, PicturebookResult};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// A style with its prompt and loaded exemplar image.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ResolvedStyle {
    /// Lowercased style id
    id: String,
    /// Conversion prompt
    prompt: String,
    /// Example rendering in this style, sent as a reference image
    exemplar: Option<ImageData>,
}

impl ResolvedStyle {
    /// Create a style without an exemplar.
    pub fn new(id: impl AsRef<str>, prompt: impl Into<String>) -> Self {
        Self {
            id: normalize_id(id.as_ref()),
            prompt: prompt.into(),
            exemplar: None,
        }
    }

    /// Attach an exemplar image.
    pub fn with_exemplar(mut self, exemplar: ImageData) -> Self {
        self.exemplar = Some(exemplar);
        self
    }
}

fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase()
}

/// The style catalog with exemplars loaded into memory.
///
/// # Examples
///
/// ```
/// use picturebook_cache::{ResolvedStyle, StyleLibrary};
///
/// let library = StyleLibrary::new([ResolvedStyle::new("Pixar", "3D animated look")], ["realistic"]);
/// assert_eq!(library.require_style("pixar").unwrap().prompt(), "3D animated look");
/// assert!(library.require_style("cubist").is_err());
/// assert!(library.is_passthrough("Realistic"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StyleLibrary {
    styles: BTreeMap<String, ResolvedStyle>,
    passthrough: Vec<String>,
}

impl StyleLibrary {
    /// Build a library from already-resolved styles.
    pub fn new<I, P>(styles: I, passthrough: P) -> Self
    where
        I: IntoIterator<Item = ResolvedStyle>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            styles: styles
                .into_iter()
                .map(|style| (style.id.clone(), style))
                .collect(),
            passthrough: passthrough
                .into_iter()
                .map(|id| normalize_id(id.as_ref()))
                .collect(),
        }
    }

    /// Validate the configuration and read every exemplar from disk.
    ///
    /// # Errors
    ///
    /// A configuration error if validation fails or an exemplar cannot be read.
    #[instrument(skip_all, fields(styles = config.styles().len()))]
    pub fn from_catalog(config: &PicturebookConfig) -> PicturebookResult<Self> {
        config.validate()?;

        let mut styles = Vec::with_capacity(config.styles().len());
        for (id, definition) in config.styles() {
            let mut style = ResolvedStyle::new(id, definition.prompt().trim());
            if let Some(path) = definition.exemplar() {
                let path = config.resolve_path(path);
                let bytes = std::fs::read(&path).map_err(|e| {
                    ConfigError::new(ConfigErrorKind::MissingExemplar {
                        style: id.clone(),
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })
                })?;
                debug!(style = %id, path = %path.display(), bytes = bytes.len(), "Loaded exemplar");
                style = style.with_exemplar(ImageData::from_bytes(bytes));
            }
            styles.push(style);
        }

        let library = Self::new(styles, config.avatar().passthrough_styles());
        info!(styles = library.styles.len(), "Style library ready");
        Ok(library)
    }

    /// Look up a style, treating an unknown id as a configuration error.
    pub fn require_style(&self, id: &str) -> PicturebookResult<&ResolvedStyle> {
        self.get(id).ok_or_else(|| {
            ConfigError::new(ConfigErrorKind::UnknownStyle {
                id: id.trim().to_string(),
                known: self.ids().join(", "),
            })
            .into()
        })
    }

    /// Look up a style by id, ignoring case.
    pub fn get(&self, id: &str) -> Option<&ResolvedStyle> {
        self.styles.get(&normalize_id(id))
    }

    /// Whether the style reuses reference photos without generation.
    pub fn is_passthrough(&self, id: &str) -> bool {
        let id = normalize_id(id);
        self.passthrough.contains(&id)
    }

    /// Known style ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        self.styles.keys().map(String::as_str).collect()
    }

    /// Iterate the styles in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedStyle> {
        self.styles.values()
    }

    /// Number of styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether the library has no styles.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
