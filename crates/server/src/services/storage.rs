//! Local disk storage for uploaded product images.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// URL prefix uploaded files are served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_CONTENT_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
const JPEG_SIGNATURE: &[u8] = &[0xff, 0xd8, 0xff];

/// Errors that can occur storing an upload.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The content type is not an accepted image type.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// The file body does not start like the declared image type.
    #[error("file content does not match {0}")]
    ContentMismatch(String),

    /// Writing to disk failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// An image accepted from a multipart form, not yet written to disk.
#[derive(Debug)]
pub struct PendingUpload {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl PendingUpload {
    /// Validate an uploaded part.
    ///
    /// The stored extension always comes from the declared content type,
    /// never from the client's file name, so `/uploads` only ever serves
    /// image types.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnsupportedType` unless the content type is
    /// JPEG, PNG, or WebP, and `StorageError::ContentMismatch` when the
    /// bytes do not carry that format's signature.
    pub fn new(content_type: Option<&str>, bytes: Vec<u8>) -> Result<Self, StorageError> {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        let extension = ALLOWED_CONTENT_TYPES
            .iter()
            .find(|(allowed, _)| *allowed == content_type)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| StorageError::UnsupportedType(content_type.clone()))?;

        if !has_signature(extension, &bytes) {
            return Err(StorageError::ContentMismatch(content_type));
        }

        Ok(Self { extension, bytes })
    }
}

fn has_signature(extension: &str, bytes: &[u8]) -> bool {
    match extension {
        "png" => bytes.starts_with(PNG_SIGNATURE),
        "jpg" => bytes.starts_with(JPEG_SIGNATURE),
        "webp" => bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP",
        _ => false,
    }
}

/// Writes uploads under a directory served at [`PUBLIC_PREFIX`].
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory uploads are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Write uploads to disk under fresh random names, returning their URLs.
    ///
    /// If any write fails, files already written by this call are removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if a write fails.
    pub async fn save_all(&self, uploads: Vec<PendingUpload>) -> Result<Vec<String>, StorageError> {
        let mut urls = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let name = format!("{}.{}", Uuid::new_v4(), upload.extension);
            if let Err(e) = tokio::fs::write(self.dir.join(&name), &upload.bytes).await {
                self.remove_all(&urls).await;
                return Err(e.into());
            }
            urls.push(format!("{PUBLIC_PREFIX}/{name}"));
        }
        Ok(urls)
    }

    /// Remove files behind the given URLs, logging failures.
    ///
    /// URLs that do not point into the upload directory are ignored.
    pub async fn remove_all(&self, urls: &[String]) {
        for url in urls {
            let Some(path) = self.path_for_url(url) else {
                continue;
            };
            if let Err(e) = tokio::fs::remove_file(&path).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload");
            }
        }
    }

    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(self.dir.join(name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0];
    const JPEG: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0];
    const WEBP: &[u8] = b"RIFF\x10\0\0\0WEBPVP8 ";

    fn temp_store() -> UploadStore {
        UploadStore::new(std::env::temp_dir().join(format!("vitrine-storage-{}", Uuid::new_v4())))
    }

    #[test]
    fn test_pending_upload_accepts_images() {
        for (content_type, bytes) in [
            ("image/jpeg", JPEG),
            ("image/jpg", JPEG),
            ("image/png", PNG),
            ("image/webp", WEBP),
            ("IMAGE/PNG", PNG),
        ] {
            assert!(PendingUpload::new(Some(content_type), bytes.to_vec()).is_ok());
        }
    }

    #[test]
    fn test_pending_upload_rejects_other_types() {
        for content_type in [Some("image/gif"), Some("text/plain"), Some("text/html"), None] {
            assert!(matches!(
                PendingUpload::new(content_type, PNG.to_vec()),
                Err(StorageError::UnsupportedType(_))
            ));
        }
    }

    #[test]
    fn test_pending_upload_extension_follows_content_type() {
        let cases = [("image/png", PNG, "png"), ("image/jpeg", JPEG, "jpg"), ("image/webp", WEBP, "webp")];
        for (content_type, bytes, extension) in cases {
            let upload = PendingUpload::new(Some(content_type), bytes.to_vec()).unwrap();
            assert_eq!(upload.extension, extension);
        }
    }

    #[test]
    fn test_pending_upload_rejects_mismatched_body() {
        let html = b"<script>alert(1)</script>".to_vec();
        assert!(matches!(
            PendingUpload::new(Some("image/png"), html),
            Err(StorageError::ContentMismatch(_))
        ));
        assert!(matches!(
            PendingUpload::new(Some("image/jpeg"), PNG.to_vec()),
            Err(StorageError::ContentMismatch(_))
        ));
        assert!(matches!(
            PendingUpload::new(Some("image/webp"), b"RIFF".to_vec()),
            Err(StorageError::ContentMismatch(_))
        ));
    }

    #[test]
    fn test_path_for_url_rejects_escapes() {
        let store = temp_store();
        assert!(store.path_for_url("/uploads/a.png").is_some());
        assert!(store.path_for_url("/uploads/../etc/passwd").is_none());
        assert!(store.path_for_url("/uploads/..").is_none());
        assert!(store.path_for_url("/elsewhere/a.png").is_none());
        assert!(store.path_for_url("/uploads/").is_none());
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let store = temp_store();
        store.ensure_dir().await.unwrap();

        let uploads = vec![
            PendingUpload::new(Some("image/png"), PNG.to_vec()).unwrap(),
            PendingUpload::new(Some("image/jpeg"), JPEG.to_vec()).unwrap(),
        ];
        let urls = store.save_all(uploads).await.unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.iter().all(|url| url.starts_with("/uploads/")));
        assert!(urls[0].ends_with(".png"));
        assert!(urls[1].ends_with(".jpg"));

        let path = store.path_for_url(&urls[0]).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), PNG);

        store.remove_all(&urls).await;
        assert!(!path.exists());

        tokio::fs::remove_dir_all(store.dir()).await.unwrap();
    }
}
