//! Capability traits for the Picturebook pipeline.
//!
//! The text and image models are opaque external capabilities. This crate
//! defines the narrow seams through which the styled asset cache talks to them:
//!
//! - [`ImageGenerator`] - turns a prompt plus reference images into an image
//! - [`QualityGate`] - scores a candidate against the character's identity photo

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ImageGenerator, QualityGate};
pub use types::{
    QualityScores, ReferenceImage, ReferenceRole, StyleConversionRequest,
    StyleConversionRequestBuilder, StyleConversionRequestBuilderError,
};
