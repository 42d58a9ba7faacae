use async_trait::async_trait;
use std::path::{Path, PathBuf};
use strict_path::{PathBoundary, StrictPath, StrictPathError};

use super::{validate_object_path, FileError, FileStore};

/// Writes objects below `root`; URLs are `{public_base}/uploads/{path}`.
/// Every object path is joined through a [`PathBoundary`], so symlinks inside
/// `root` cannot lead a write or delete outside it.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    public_base: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/uploads/{}", self.public_base, path)
    }

    fn resolve(&self, path: &str) -> Result<StrictPath, FileError> {
        validate_object_path(path)?;
        let boundary: PathBoundary = PathBoundary::try_new_create(&self.root).map_err(boundary_error)?;
        boundary.strict_join(path).map_err(|e| match e {
            StrictPathError::PathEscapesBoundary { .. } => {
                tracing::warn!(path = %path, "object path escapes the upload directory");
                FileError::InvalidPath(path.to_string())
            }
            other => boundary_error(other),
        })
    }
}

fn boundary_error(e: StrictPathError) -> FileError {
    FileError::Io(std::io::Error::other(e.to_string()))
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, FileError> {
        let file_path = self.resolve(path)?;
        let file_path = Path::new(file_path.interop_path());
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(file_path, bytes).await?;

        tracing::info!(
            path = %path,
            size = bytes.len(),
            content_type = %content_type,
            "file uploaded"
        );
        Ok(self.url_for(path))
    }

    async fn delete(&self, path: &str) -> Result<(), FileError> {
        let file_path = self.resolve(path)?;
        match tokio::fs::remove_file(file_path.interop_path()).await {
            Ok(()) => {
                tracing::info!(path = %path, "file deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FileError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("portfolio-cms-{}-{}", name, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let root = temp_root("upload");
        let store = LocalFileStore::new(&root, "https://example.com/");

        let url = store
            .upload("hero/profile-1", b"\x89PNG....", "image/png")
            .await
            .unwrap();

        assert_eq!(url, "https://example.com/uploads/hero/profile-1");
        let written = tokio::fs::read(root.join("hero/profile-1")).await.unwrap();
        assert_eq!(written, b"\x89PNG....");

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn test_delete_then_delete_again_is_not_found() {
        let root = temp_root("delete");
        let store = LocalFileStore::new(&root, "");
        store
            .upload("certificates/cert-1", b"data", "image/png")
            .await
            .unwrap();

        store.delete("certificates/cert-1").await.unwrap();
        assert!(matches!(
            store.delete("certificates/cert-1").await,
            Err(FileError::NotFound(_))
        ));

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_is_rejected() {
        let root = temp_root("symlink-root");
        let outside = temp_root("symlink-outside");
        tokio::fs::create_dir_all(&root).await.unwrap();
        tokio::fs::create_dir_all(&outside).await.unwrap();
        std::os::unix::fs::symlink(&outside, root.join("projects")).unwrap();

        let store = LocalFileStore::new(&root, "");
        assert!(matches!(
            store.upload("projects/evil-1.png", b"x", "image/png").await,
            Err(FileError::InvalidPath(_))
        ));
        assert!(!outside.join("evil-1.png").exists());

        tokio::fs::remove_dir_all(&root).await.ok();
        tokio::fs::remove_dir_all(&outside).await.ok();
    }

    #[tokio::test]
    async fn test_traversal_is_rejected_before_io() {
        let store = LocalFileStore::new(temp_root("traversal"), "");
        assert!(matches!(
            store.upload("../escape", b"x", "image/png").await,
            Err(FileError::InvalidPath(_))
        ));
        assert!(matches!(
            store.delete("projects/../../etc/passwd").await,
            Err(FileError::InvalidPath(_))
        ));
    }
}
