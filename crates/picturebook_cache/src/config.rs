//! Configuration for the styled asset cache.
//!
//! Settings come from TOML with the usual precedence:
//! - Bundled defaults (include_str! from picturebook.toml)
//! - User overrides (~/.config/picturebook/picturebook.toml, then ./picturebook.toml)
//!
//! Style tables merge by id, so a user file can add a style or replace one
//! prompt without restating the rest of the catalog.

use derive_getters::Getters;
use derive_setters::Setters;
use picturebook_error::{ConfigError, ConfigErrorKind, PicturebookError, PicturebookResult};
use picturebook_interface::QualityScores;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../picturebook.toml");

fn default_max_attempts() -> u32 {
    2
}

fn default_min_score() -> u8 {
    5
}

fn default_max_dimension() -> u32 {
    768
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_passthrough_styles() -> Vec<String> {
    vec!["realistic".to_string()]
}

/// Tuning for avatar generation.
///
/// # Example
///
/// ```toml
/// [avatar]
/// max_attempts = 3
/// min_face_score = 6
/// passthrough_styles = ["realistic", "photo"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct AvatarSettings {
    /// Generation attempts per avatar, counting the first
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,

    /// Minimum face-match score (0-10) to accept a candidate
    #[serde(default = "default_min_score")]
    min_face_score: u8,

    /// Minimum clothing-match score (0-10), applied when an outfit description exists
    #[serde(default = "default_min_score")]
    min_clothing_score: u8,

    /// Long-side pixel bound for stored avatars
    #[serde(default = "default_max_dimension")]
    max_dimension: u32,

    /// JPEG quality used when re-encoding stored avatars
    #[serde(default = "default_jpeg_quality")]
    jpeg_quality: u8,

    /// Base delay between attempts in milliseconds (0 disables the pause)
    #[serde(default = "default_retry_backoff_ms")]
    retry_backoff_ms: u64,

    /// Style ids that reuse the reference photos without generation
    #[serde(default = "default_passthrough_styles")]
    passthrough_styles: Vec<String>,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            min_face_score: default_min_score(),
            min_clothing_score: default_min_score(),
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
            retry_backoff_ms: default_retry_backoff_ms(),
            passthrough_styles: default_passthrough_styles(),
        }
    }
}

impl AvatarSettings {
    /// Check the settings against their allowed ranges.
    pub fn validate(&self) -> PicturebookResult<()> {
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1".to_string()));
        }
        for (field, score) in [
            ("min_face_score", self.min_face_score),
            ("min_clothing_score", self.min_clothing_score),
        ] {
            if score > QualityScores::MAX {
                return Err(invalid(
                    field,
                    format!("must be between 0 and {}, got {}", QualityScores::MAX, score),
                ));
            }
        }
        if self.max_dimension == 0 {
            return Err(invalid("max_dimension", "must be positive".to_string()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(invalid(
                "jpeg_quality",
                format!("must be between 1 and 100, got {}", self.jpeg_quality),
            ));
        }
        Ok(())
    }

    /// Whether a style id reuses the reference photos untouched.
    pub fn is_passthrough(&self, style: &str) -> bool {
        let style = style.trim();
        self.passthrough_styles
            .iter()
            .any(|id| id.eq_ignore_ascii_case(style))
    }
}

/// One art style in the catalog.
///
/// # Example
///
/// ```toml
/// [styles.pixar]
/// prompt = "Re-render this person as a 3D animated film character"
/// exemplar = "styles/pixar.png"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct StyleDefinition {
    /// Conversion prompt sent with every generation request
    prompt: String,

    /// Optional exemplar image, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exemplar: Option<PathBuf>,
}

impl StyleDefinition {
    /// Create a style definition without an exemplar.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            exemplar: None,
        }
    }

    /// Attach an exemplar image path.
    pub fn with_exemplar(mut self, path: impl Into<PathBuf>) -> Self {
        self.exemplar = Some(path.into());
        self
    }
}

/// Top-level Picturebook configuration.
///
/// # Example
///
/// ```no_run
/// use picturebook_cache::PicturebookConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PicturebookConfig::load()?;
/// config.validate()?;
/// println!("{} styles", config.styles().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, Getters)]
pub struct PicturebookConfig {
    /// Avatar generation settings
    #[serde(default)]
    avatar: AvatarSettings,

    /// Style catalog keyed by style id
    #[serde(default)]
    styles: BTreeMap<String, StyleDefinition>,

    /// Directory that relative exemplar paths are resolved against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl PicturebookConfig {
    /// Assemble a configuration in code.
    pub fn new(avatar: AvatarSettings, styles: BTreeMap<String, StyleDefinition>) -> Self {
        Self {
            avatar,
            styles,
            base_dir: None,
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// Relative exemplar paths resolve against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> PicturebookResult<Self> {
        debug!("Loading configuration from file");
        let path = path.as_ref();

        let mut loaded: Self = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| load_error(path.display().to_string(), e))?
            .try_deserialize()
            .map_err(|e| load_error(path.display().to_string(), e))?;

        loaded.base_dir = path.parent().map(Path::to_path_buf);
        Ok(loaded)
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped when absent.
    #[instrument]
    pub fn load() -> PicturebookResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/picturebook/picturebook.toml");
            builder = builder.add_source(config::File::from(home_config).required(false));
        }

        builder = builder.add_source(config::File::with_name("picturebook").required(false));

        builder
            .build()
            .map_err(|e| load_error("layered configuration", e))?
            .try_deserialize()
            .map_err(|e| load_error("layered configuration", e))
    }

    /// The bundled defaults alone, ignoring any user files.
    pub fn bundled() -> PicturebookResult<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(|e| load_error("bundled defaults", e))
    }

    /// Reject settings out of range and styles without a prompt.
    #[instrument(skip(self), fields(styles = self.styles.len()))]
    pub fn validate(&self) -> PicturebookResult<()> {
        self.avatar.validate()?;
        if self.styles.is_empty() {
            return Err(ConfigError::new(ConfigErrorKind::EmptyCatalog).into());
        }
        for (id, style) in &self.styles {
            if id.trim().is_empty() {
                return Err(ConfigError::new(ConfigErrorKind::BlankStyleId).into());
            }
            if style.prompt.trim().is_empty() {
                return Err(ConfigError::new(ConfigErrorKind::EmptyPrompt(id.clone())).into());
            }
        }
        debug!("Configuration valid");
        Ok(())
    }

    /// Resolve an exemplar path against the config file's directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Replace the avatar settings.
    pub fn with_avatar(mut self, avatar: AvatarSettings) -> Self {
        self.avatar = avatar;
        self
    }

    /// Add or replace one style.
    pub fn with_style(mut self, id: impl Into<String>, style: StyleDefinition) -> Self {
        self.styles.insert(id.into(), style);
        self
    }
}

#[track_caller]
fn invalid(field: &'static str, reason: String) -> PicturebookError {
    ConfigError::new(ConfigErrorKind::InvalidSetting { field, reason }).into()
}

#[track_caller]
fn load_error(origin: impl Into<String>, e: config::ConfigError) -> PicturebookError {
    ConfigError::new(ConfigErrorKind::Load {
        origin: origin.into(),
        reason: e.to_string(),
    })
    .into()
}
