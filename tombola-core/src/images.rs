//! Image ingestion for prize and background pictures.
//!
//! The draw protocol only ever stores the resulting reference string; the
//! size check happens here, at the producer, so an oversized picture fails
//! the originating operation instead of poisoning the shared store.

use crate::error::{Result, TombolaError};
use base64::{engine::general_purpose, Engine as _};

/// Per-image limit, below the store's own value limit so a projection that
/// embeds an image reference still fits.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }
}

/// Check type (by magic bytes) and size.
pub fn validate(bytes: &[u8]) -> Result<ImageKind> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(TombolaError::validation(format!(
            "image is {} bytes, limit is {} bytes",
            bytes.len(),
            MAX_IMAGE_BYTES
        )));
    }

    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]) {
        return Ok(ImageKind::Png);
    }
    if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        return Ok(ImageKind::Jpeg);
    }

    Err(TombolaError::validation(
        "unsupported image format, expected PNG or JPEG",
    ))
}

/// Validate and encode into the stored reference form.
pub fn to_stored_form(bytes: &[u8]) -> Result<String> {
    let kind = validate(bytes)?;
    Ok(format!(
        "data:{};base64,{}",
        kind.mime(),
        general_purpose::STANDARD.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00];
    const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00];

    #[test]
    fn detects_png_and_jpeg() {
        assert_eq!(validate(PNG_MAGIC).unwrap(), ImageKind::Png);
        assert_eq!(validate(JPEG_MAGIC).unwrap(), ImageKind::Jpeg);
    }

    #[test]
    fn rejects_unknown_formats() {
        assert!(matches!(
            validate(b"GIF89a...."),
            Err(TombolaError::Validation(_))
        ));
    }

    #[test]
    fn rejects_oversized_images() {
        let mut big = vec![0u8; MAX_IMAGE_BYTES + 1];
        big[..3].copy_from_slice(&[0xff, 0xd8, 0xff]);
        assert!(matches!(
            validate(&big),
            Err(TombolaError::Validation(_))
        ));
    }

    #[test]
    fn stored_form_carries_mime_prefix() {
        let stored = to_stored_form(PNG_MAGIC).unwrap();
        assert!(stored.starts_with("data:image/png;base64,"));
    }
}
