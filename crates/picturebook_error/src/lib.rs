//! Error types for the Picturebook pipeline.
//!
//! This crate provides the foundation error types used throughout the Picturebook workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Text that simply does not match any known outline or scene pattern is not an
//! error anywhere in the pipeline; parsers return `None` or empty collections instead.
//!
//! # Examples
//!
//! ```
//! use picturebook_error::{ConfigError, ConfigErrorKind, PicturebookResult};
//!
//! fn load_style() -> PicturebookResult<String> {
//!     Err(ConfigError::new(ConfigErrorKind::UnknownStyle {
//!         id: "cubist".to_string(),
//!         known: "pixar, watercolor".to_string(),
//!     }))?
//! }
//!
//! match load_style() {
//!     Ok(prompt) => println!("Got: {}", prompt),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod character;
mod config;
mod error;
mod generation;
mod image;
mod json;
mod outline;

pub use builder::{BuilderError, BuilderErrorKind};
pub use character::{CharacterError, CharacterErrorKind};
pub use config::{ConfigError, ConfigErrorKind};
pub use error::{PicturebookError, PicturebookErrorKind, PicturebookResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use image::{ImageError, ImageErrorKind};
pub use json::JsonError;
pub use outline::{OutlineError, OutlineErrorKind};
