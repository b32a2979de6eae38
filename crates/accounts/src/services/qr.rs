//! QR code generation for profiles.
//!
//! Every profile gets a QR code image encoding its KT identifier, written
//! under the media root next to uploaded pictures. Generation happens after
//! the registration transaction commits; a failure here leaves the profile's
//! `qr_code` column NULL (placeholder semantics) and is only logged.

use std::path::{Path, PathBuf};

use image::Luma;
use qrcode::QrCode;
use thiserror::Error;

use kabaditech_core::{Email, KtId};

/// Pixels per QR module.
const MODULE_PIXELS: u32 = 8;

/// Errors that can occur when generating a QR code.
#[derive(Debug, Error)]
pub enum QrError {
    /// The payload could not be encoded.
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    /// Writing the image to disk failed.
    #[error("QR image write failed: {0}")]
    Image(#[from] image::ImageError),

    /// Creating the output directory failed.
    #[error("media directory error: {0}")]
    Io(#[from] std::io::Error),
}

/// Generates profile QR codes into the media root.
#[derive(Debug, Clone)]
pub struct QrService {
    media_root: PathBuf,
}

impl QrService {
    /// Create a new QR service writing under the given media root.
    #[must_use]
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Generate the QR code for a profile and return its media-relative path.
    ///
    /// # Errors
    ///
    /// Returns `QrError` if encoding or writing fails.
    pub fn generate_profile_qr(&self, kt_id: &KtId, email: &Email) -> Result<String, QrError> {
        let payload = format!("kabaditech:{kt_id}:{email}");
        let code = QrCode::new(payload.as_bytes())?;

        let image = code
            .render::<Luma<u8>>()
            .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
            .build();

        let relative = format!("qr_codes/{kt_id}.png");
        let target = self.media_root.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        image.save(&target)?;

        tracing::debug!(path = %target.display(), "QR code written");
        Ok(relative)
    }

    /// The media root this service writes under.
    #[must_use]
    pub fn media_root(&self) -> &Path {
        &self.media_root
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kabaditech_core::IdPrefix;

    #[test]
    fn test_generate_writes_png_under_media_root() {
        let dir = std::env::temp_dir().join(format!("kt-qr-test-{}", std::process::id()));
        let service = QrService::new(&dir);

        let kt_id = KtId::allocate(IdPrefix::Ktdk, 1);
        let email = Email::parse("dealer@example.com").unwrap();

        let relative = service.generate_profile_qr(&kt_id, &email).unwrap();
        assert_eq!(relative, "qr_codes/KTDK100001.png");

        let written = dir.join(&relative);
        assert!(written.exists());
        // PNG magic bytes
        let bytes = std::fs::read(&written).unwrap();
        assert_eq!(bytes.get(..4), Some(&b"\x89PNG"[..]));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
