//! File Store
//! Binary uploads for hero images, CVs, project and certificate images.

pub mod local;

use async_trait::async_trait;
use chrono::Utc;
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};

pub use local::LocalFileStore;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024; // 5MB

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("invalid object path: {0}")]
    InvalidPath(String),

    #[error("file is empty")]
    Empty,

    #[error("file too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("file content is not an accepted {0} type")]
    UnsupportedType(&'static str),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("file storage error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores `bytes` at `path` and returns a publicly fetchable URL.
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, FileError>;

    async fn delete(&self, path: &str) -> Result<(), FileError>;
}

/// Rejects absolute paths, empty or `..` segments, backslashes and NUL bytes.
pub fn validate_object_path(path: &str) -> Result<(), FileError> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.contains('\0')
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if invalid {
        return Err(FileError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// What an upload is for; decides its object path and accepted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadTarget {
    HeroProfile,
    HeroCv,
    Project,
    Certificate,
}

impl UploadTarget {
    /// Object path for an upload made at Unix millisecond `millis`.
    /// `nonce` keeps same-millisecond uploads apart and `extension` follows the
    /// detected content type. `slug` only applies to project images and falls back to `new`.
    pub fn object_path(self, slug: Option<&str>, millis: i64, nonce: &str, extension: &str) -> String {
        let stem = match self {
            UploadTarget::HeroProfile => "hero/profile".to_string(),
            UploadTarget::HeroCv => "hero/cv".to_string(),
            UploadTarget::Project => {
                let slug = slug
                    .filter(|s| crate::content::slug::is_valid_slug(s))
                    .unwrap_or("new");
                format!("projects/{slug}")
            }
            UploadTarget::Certificate => "certificates/cert".to_string(),
        };
        format!("{stem}-{millis}-{nonce}.{extension}")
    }

    /// Path for an upload of `content_type` made now.
    pub fn current_path(self, slug: Option<&str>, content_type: &str) -> String {
        let nonce = Alphanumeric
            .sample_string(&mut rand::rng(), 6)
            .to_lowercase();
        self.object_path(
            slug,
            Utc::now().timestamp_millis(),
            &nonce,
            extension_for(content_type),
        )
    }

    /// Checks size and magic bytes, returning the detected MIME type.
    pub fn inspect(self, bytes: &[u8]) -> Result<&'static str, FileError> {
        if bytes.is_empty() {
            return Err(FileError::Empty);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(FileError::TooLarge {
                size: bytes.len(),
                max: MAX_UPLOAD_BYTES,
            });
        }
        match self {
            UploadTarget::HeroCv => {
                detect_document_mime(bytes).ok_or(FileError::UnsupportedType("document"))
            }
            _ => detect_image_mime(bytes).ok_or(FileError::UnsupportedType("image")),
        }
    }
}

/// File extension for a content type returned by [`UploadTarget::inspect`].
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        _ => "bin",
    }
}

fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: RIFF ....WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn detect_document_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        // %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => Some("application/pdf"),
        // OLE compound file (legacy .doc)
        [0xD0, 0xCF, 0x11, 0xE0, ..] => Some("application/msword"),
        // ZIP container (.docx)
        [0x50, 0x4B, 0x03, 0x04, ..] => Some(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const PDF: &[u8] = b"%PDF-1.7\n";

    #[test]
    fn test_object_paths() {
        assert_eq!(
            UploadTarget::HeroProfile.object_path(None, 1700000000000, "a1b2c3", "png"),
            "hero/profile-1700000000000-a1b2c3.png"
        );
        assert_eq!(
            UploadTarget::HeroCv.object_path(None, 5, "x", "pdf"),
            "hero/cv-5-x.pdf"
        );
        assert_eq!(
            UploadTarget::Project.object_path(Some("robot-arm"), 7, "x", "jpg"),
            "projects/robot-arm-7-x.jpg"
        );
        assert_eq!(
            UploadTarget::Project.object_path(None, 7, "x", "jpg"),
            "projects/new-7-x.jpg"
        );
        assert_eq!(
            UploadTarget::Certificate.object_path(None, 9, "x", "webp"),
            "certificates/cert-9-x.webp"
        );
    }

    #[test]
    fn test_project_path_ignores_unsafe_slug() {
        assert_eq!(
            UploadTarget::Project.object_path(Some("../etc"), 1, "x", "png"),
            "projects/new-1-x.png"
        );
    }

    #[test]
    fn test_current_paths_carry_extension_and_differ() {
        let first = UploadTarget::HeroProfile.current_path(None, "image/png");
        let second = UploadTarget::HeroProfile.current_path(None, "image/png");
        assert!(first.starts_with("hero/profile-"));
        assert!(first.ends_with(".png"));
        assert_ne!(first, second);
        assert!(validate_object_path(&first).is_ok());
        assert!(UploadTarget::HeroCv
            .current_path(None, "application/msword")
            .ends_with(".doc"));
    }

    #[test]
    fn test_validate_object_path() {
        assert!(validate_object_path("hero/profile-1").is_ok());
        for bad in ["", "/abs", "a/../b", "..", "a//b", "a\\b", "a/\0", "a/./b", "a/"] {
            assert!(validate_object_path(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_inspect_images() {
        assert_eq!(UploadTarget::Project.inspect(PNG).unwrap(), "image/png");
        assert_eq!(
            UploadTarget::Certificate
                .inspect(&[0xFF, 0xD8, 0xFF, 0xE0])
                .unwrap(),
            "image/jpeg"
        );
        assert!(matches!(
            UploadTarget::HeroProfile.inspect(PDF),
            Err(FileError::UnsupportedType("image"))
        ));
    }

    #[test]
    fn test_inspect_cv_documents() {
        assert_eq!(UploadTarget::HeroCv.inspect(PDF).unwrap(), "application/pdf");
        assert!(UploadTarget::HeroCv.inspect(PNG).is_err());
    }

    #[test]
    fn test_inspect_rejects_empty_and_oversized() {
        assert!(matches!(
            UploadTarget::Project.inspect(&[]),
            Err(FileError::Empty)
        ));
        let big = vec![0xFF; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            UploadTarget::Project.inspect(&big),
            Err(FileError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_upload_target_serde_names() {
        let target: UploadTarget = serde_json::from_str("\"hero-cv\"").unwrap();
        assert_eq!(target, UploadTarget::HeroCv);
    }
}
