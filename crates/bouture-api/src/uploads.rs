//! Image storage. Uploaded images land in a flat directory under a fresh
//! random name; the entity row only ever holds the bare file name. When an
//! edit carries no new image the previous name is kept as-is, and replaced
//! images are never deleted from disk, so stale references keep resolving.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::Multipart;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;

/// 5 MB upload limit for images
const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Store `upload` and return the name to persist. With no upload the
    /// existing name passes through untouched.
    pub async fn resolve(
        &self,
        existing: Option<String>,
        upload: Option<ImageUpload>,
    ) -> Result<Option<String>, ApiError> {
        let Some(upload) = upload else {
            return Ok(existing);
        };

        if upload.bytes.is_empty() {
            return Ok(existing);
        }
        if upload.bytes.len() > MAX_IMAGE_SIZE {
            return Err(ApiError::BadRequest("image trop volumineuse".into()));
        }

        let ext = extension_for(&upload);

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            error!("failed to create image directory {}: {e}", self.dir.display());
            ApiError::Internal(e.into())
        })?;

        // A name already on disk is never reused; re-roll until one is free.
        let name = loop {
            let candidate = format!("{}.{ext}", Uuid::new_v4());
            if self.try_write(&candidate, &upload.bytes).await? {
                break candidate;
            }
        };

        info!("stored image {name} ({} bytes)", upload.bytes.len());
        Ok(Some(name))
    }

    /// Claim `name` with `create_new`, which refuses to touch a file that
    /// already exists. `Ok(false)` means the name is taken.
    async fn try_write(&self, name: &str, bytes: &[u8]) -> Result<bool, ApiError> {
        let path = self.dir.join(name);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                error!("failed to create image {}: {e}", path.display());
                return Err(ApiError::Internal(e.into()));
            }
        };
        file.write_all(bytes).await.map_err(|e| {
            error!("failed to write image {}: {e}", path.display());
            ApiError::Internal(e.into())
        })?;
        Ok(true)
    }
}

fn extension_for(upload: &ImageUpload) -> String {
    match upload.content_type.as_deref() {
        Some("image/jpeg") => return "jpg".into(),
        Some("image/png") => return "png".into(),
        Some("image/gif") => return "gif".into(),
        Some("image/webp") => return "webp".into(),
        _ => {}
    }
    upload
        .filename
        .as_deref()
        .and_then(|f| Path::new(f).extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".into())
}

/// Pull the first file field out of a multipart body, whatever its name.
pub async fn first_image(mut multipart: Multipart) -> Result<Option<ImageUpload>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart invalide: {e}")))?
    {
        if field.file_name().is_none() && field.content_type().is_none() {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("multipart invalide: {e}")))?;
        return Ok(Some(ImageUpload {
            filename,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: Option<&str>, filename: Option<&str>) -> ImageUpload {
        ImageUpload {
            filename: filename.map(str::to_string),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::from_static(b"fake image bytes"),
        }
    }

    fn store() -> ImageStore {
        ImageStore::new(std::env::temp_dir().join(format!("bouture-img-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn no_upload_keeps_the_existing_name() {
        let store = store();
        let kept = store
            .resolve(Some("old.jpg".into()), None)
            .await
            .unwrap();
        assert_eq!(kept.as_deref(), Some("old.jpg"));
    }

    #[tokio::test]
    async fn upload_writes_a_fresh_random_name() {
        let store = store();
        let name = store
            .resolve(None, Some(upload(Some("image/png"), None)))
            .await
            .unwrap()
            .unwrap();
        assert!(name.ends_with(".png"));
        assert!(store.path_of(&name).exists());
    }

    #[tokio::test]
    async fn replacement_leaves_the_old_file_on_disk() {
        let store = store();
        let first = store
            .resolve(None, Some(upload(Some("image/jpeg"), None)))
            .await
            .unwrap()
            .unwrap();
        let second = store
            .resolve(Some(first.clone()), Some(upload(Some("image/jpeg"), None)))
            .await
            .unwrap()
            .unwrap();
        assert_ne!(first, second);
        assert!(store.path_of(&first).exists());
        assert!(store.path_of(&second).exists());
    }

    #[tokio::test]
    async fn a_taken_name_is_never_overwritten() {
        let store = store();
        tokio::fs::create_dir_all(&store.dir).await.unwrap();
        tokio::fs::write(store.path_of("taken.png"), b"original")
            .await
            .unwrap();

        let claimed = store.try_write("taken.png", b"intruder").await.unwrap();
        assert!(!claimed);
        let content = tokio::fs::read(store.path_of("taken.png")).await.unwrap();
        assert_eq!(content, b"original");

        // A free name is claimed on the first attempt.
        let claimed = store.try_write("free.png", b"payload").await.unwrap();
        assert!(claimed);
    }

    #[test]
    fn extension_falls_back_to_the_filename() {
        let u = upload(Some("application/octet-stream"), Some("photo.JPEG"));
        assert_eq!(extension_for(&u), "jpeg");
        let u = upload(None, None);
        assert_eq!(extension_for(&u), "bin");
    }
}
