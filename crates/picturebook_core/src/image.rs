//! Opaque image payloads exchanged with the generation capabilities.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use picturebook_error::{ImageError, ImageErrorKind};
use std::fmt;
use std::sync::Arc;

/// Encoded image bytes plus their MIME type.
///
/// Cloning is cheap: the bytes are shared, so clones of one generation result
/// compare equal under [`ImageData::ptr_eq`].
///
/// # Examples
///
/// ```
/// use picturebook_core::ImageData;
///
/// let image = ImageData::new(vec![0x89, 0x50, 0x4E, 0x47], "image/png");
/// let copy = image.clone();
/// assert!(image.ptr_eq(&copy));
/// assert_eq!(image.len(), 4);
///
/// let parsed = ImageData::from_data_uri(&image.to_data_uri()).unwrap();
/// assert_eq!(parsed, image);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageData {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl ImageData {
    /// Wrap encoded image bytes.
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
            mime_type: mime_type.into(),
        }
    }

    /// Wrap bytes and guess the MIME type from their magic number.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let mime_type = sniff_mime_type(&bytes);
        Self::new(bytes, mime_type)
    }

    /// Decode a `data:<mime>;base64,<payload>` URI.
    ///
    /// A bare base64 string without the `data:` prefix is accepted as well.
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageError> {
        let uri = uri.trim();
        let Some(rest) = uri.strip_prefix("data:") else {
            let bytes = decode_base64(uri)?;
            return Ok(Self::from_bytes(bytes));
        };

        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            ImageError::new(ImageErrorKind::InvalidData(
                "data URI has no ',' separator".to_string(),
            ))
        })?;
        let Some(mime_type) = header.strip_suffix(";base64") else {
            return Err(ImageError::new(ImageErrorKind::InvalidData(format!(
                "data URI is not base64 encoded: {}",
                header
            ))));
        };

        let bytes = decode_base64(payload)?;
        if mime_type.is_empty() {
            Ok(Self::from_bytes(bytes))
        } else {
            Ok(Self::new(bytes, mime_type))
        }
    }

    /// Encode as a `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// The encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when both handles share one allocation.
    pub fn ptr_eq(&self, other: &ImageData) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// True when both handles hold the same bytes, shared or not.
    pub fn same_content(&self, other: &ImageData) -> bool {
        self.ptr_eq(other) || self.bytes == other.bytes
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn decode_base64(payload: &str) -> Result<Vec<u8>, ImageError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ImageError::new(ImageErrorKind::InvalidData(e.to_string())))
}

fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}
