use std::{path::PathBuf, sync::Arc};

use serde::Serialize;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::errors::{ServiceError, UploadRejection};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Image,
    Video,
}

/// Accepted media types and the extension each is stored under. Types that
/// a browser could render as a document (SVG, HTML) are not listed.
const MEDIA_TYPES: &[(&str, UploadKind, &str)] = &[
    ("image/jpeg", UploadKind::Image, "jpg"),
    ("image/pjpeg", UploadKind::Image, "jpg"),
    ("image/png", UploadKind::Image, "png"),
    ("image/gif", UploadKind::Image, "gif"),
    ("image/webp", UploadKind::Image, "webp"),
    ("image/avif", UploadKind::Image, "avif"),
    ("image/bmp", UploadKind::Image, "bmp"),
    ("video/mp4", UploadKind::Video, "mp4"),
    ("video/webm", UploadKind::Video, "webm"),
    ("video/quicktime", UploadKind::Video, "mov"),
    ("video/ogg", UploadKind::Video, "ogv"),
    ("video/mpeg", UploadKind::Video, "mpeg"),
    ("video/x-msvideo", UploadKind::Video, "avi"),
    ("video/x-matroska", UploadKind::Video, "mkv"),
];

fn media_type(content_type: &str) -> Result<(UploadKind, &'static str), ServiceError> {
    let essence = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(mime, _, _)| *mime == essence)
        .map(|(_, kind, ext)| (*kind, *ext))
        .ok_or_else(|| ServiceError::Upload(UploadRejection::UnsupportedType(content_type.to_string())))
}

impl UploadKind {
    pub fn from_content_type(content_type: &str) -> Result<Self, ServiceError> {
        media_type(content_type).map(|(kind, _)| kind)
    }
}

/// A file that has been written into the upload directory.
#[derive(Clone, Debug, Serialize)]
pub struct StoredUpload {
    pub file_name: String,
    pub public_url: String,
    pub content_type: String,
    pub kind: UploadKind,
    pub size: usize,
}

/// Saves image and video uploads under random names.
///
/// Saving is independent of any record insert that follows it; a failed
/// insert leaves the file behind.
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
    public_prefix: String,
}

impl UploadStore {
    pub async fn new<P: Into<PathBuf>>(dir: P, max_bytes: usize) -> Result<Arc<Self>, ServiceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(ServiceError::storage)?;
        Ok(Arc::new(Self { dir, max_bytes, public_prefix: "/uploads".into() }))
    }

    pub fn max_bytes(&self) -> usize { self.max_bytes }

    pub fn dir(&self) -> &std::path::Path { &self.dir }

    pub fn path_of(&self, file_name: &str) -> PathBuf { self.dir.join(file_name) }

    pub async fn save(
        &self,
        original_name: Option<&str>,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredUpload, ServiceError> {
        let (kind, ext) = media_type(content_type)?;
        if bytes.is_empty() {
            return Err(ServiceError::Upload(UploadRejection::Empty));
        }
        if bytes.len() > self.max_bytes {
            return Err(ServiceError::Upload(UploadRejection::TooLarge { limit: self.max_bytes }));
        }

        // The client's file name never picks the extension; `ServeDir` derives
        // the served content type from it.
        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        fs::write(self.path_of(&file_name), bytes).await.map_err(ServiceError::storage)?;
        info!(file = %file_name, original = ?original_name, size = bytes.len(), kind = ?kind, "upload stored");

        Ok(StoredUpload {
            public_url: format!("{}/{}", self.public_prefix, file_name),
            file_name,
            content_type: content_type.to_string(),
            kind,
            size: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("salon_uploads_{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn saves_image_under_random_name() -> Result<(), anyhow::Error> {
        let dir = tmp_dir();
        let store = UploadStore::new(&dir, 1024).await?;

        let up = store.save(Some("Nails.PNG"), "image/png", b"\x89PNG fake").await?;
        assert_eq!(up.kind, UploadKind::Image);
        assert!(up.file_name.ends_with(".png"));
        assert_eq!(up.public_url, format!("/uploads/{}", up.file_name));
        assert_eq!(fs::read(store.path_of(&up.file_name)).await?, b"\x89PNG fake");

        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn rejects_wrong_type_empty_and_oversize() -> Result<(), anyhow::Error> {
        let dir = tmp_dir();
        let store = UploadStore::new(&dir, 4).await?;

        assert!(matches!(
            store.save(Some("x.pdf"), "application/pdf", b"data").await,
            Err(ServiceError::Upload(UploadRejection::UnsupportedType(_)))
        ));
        assert!(matches!(
            store.save(Some("x.mp4"), "video/mp4", b"").await,
            Err(ServiceError::Upload(UploadRejection::Empty))
        ));
        assert!(matches!(
            store.save(Some("x.mp4"), "video/mp4", b"12345").await,
            Err(ServiceError::Upload(UploadRejection::TooLarge { limit: 4 }))
        ));

        let mut entries = fs::read_dir(&dir).await?;
        assert!(entries.next_entry().await?.is_none());
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn extension_follows_checked_media_type_not_client_name() -> Result<(), anyhow::Error> {
        let dir = tmp_dir();
        let store = UploadStore::new(&dir, 1024).await?;

        let up = store.save(Some("evil.html"), "image/png", b"<script>alert(1)</script>").await?;
        assert!(up.file_name.ends_with(".png"), "{}", up.file_name);
        let up = store.save(Some("clip"), "video/quicktime", b"moov").await?;
        assert!(up.file_name.ends_with(".mov"));
        let up = store.save(Some("../../etc/passwd.sh"), "image/jpeg; charset=binary", b"jfif").await?;
        assert!(up.file_name.ends_with(".jpg"));
        assert!(!up.file_name.contains('/'));

        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn svg_is_rejected() -> Result<(), anyhow::Error> {
        let dir = tmp_dir();
        let store = UploadStore::new(&dir, 1024).await?;
        assert!(matches!(
            store.save(Some("logo.svg"), "image/svg+xml", b"<svg onload=alert(1)/>").await,
            Err(ServiceError::Upload(UploadRejection::UnsupportedType(_)))
        ));
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        assert_eq!(UploadKind::from_content_type("image/webp; q=1").unwrap(), UploadKind::Image);
        assert_eq!(UploadKind::from_content_type("Video/MP4").unwrap(), UploadKind::Video);
        assert!(UploadKind::from_content_type("image/").is_err());
        assert!(UploadKind::from_content_type("text/html").is_err());
    }
}
