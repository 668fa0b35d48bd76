//! On-disk storage for note images.
//!
//! Files live under `<root>/user_images/<user_id>/`. Storage keys carry a
//! random uuid prefix so two uploads with the same filename never collide;
//! the uploaded filename is kept only as metadata on [`NoteImage`].

use std::{
  io,
  path::{Component, Path, PathBuf},
};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
  error::{FieldError, ValidationErrors},
  input::ImageUpload,
  note::NoteImage,
};

pub const IMAGE_FIELD: &str = "image";
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const USER_IMAGES_DIR: &str = "user_images";

/// Filesystem image store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct MediaRoot {
  root:      PathBuf,
  max_bytes: usize,
}

impl MediaRoot {
  pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
    Self { root: root.into(), max_bytes }
  }

  pub fn root(&self) -> &Path { &self.root }

  pub fn max_bytes(&self) -> usize { self.max_bytes }

  /// Reject uploads that are empty, too large, or not a supported image.
  /// Returns the sniffed media type.
  pub fn check(&self, upload: &ImageUpload) -> Result<&'static str, ValidationErrors> {
    if upload.bytes.is_empty() {
      return Err(FieldError::new(IMAGE_FIELD, "the submitted file is empty").into());
    }
    if upload.bytes.len() > self.max_bytes {
      return Err(
        FieldError::new(
          IMAGE_FIELD,
          format!("must be at most {} bytes", self.max_bytes),
        )
        .into(),
      );
    }
    sniff_media_type(&upload.bytes).ok_or_else(|| {
      FieldError::new(
        IMAGE_FIELD,
        "upload a valid image (JPEG, PNG, GIF or WebP)",
      )
      .into()
    })
  }

  /// Write `upload` below the user's directory and describe the result.
  ///
  /// Callers validate with [`MediaRoot::check`] first; an unrecognised
  /// payload is stored as `application/octet-stream`.
  pub async fn store(&self, user_id: i64, upload: &ImageUpload) -> io::Result<NoteImage> {
    let original_name = sanitize_file_name(&upload.file_name);
    let key = format!(
      "{USER_IMAGES_DIR}/{user_id}/{}-{original_name}",
      Uuid::new_v4().simple()
    );
    let full = self.root.join(&key);
    if let Some(dir) = full.parent() {
      tokio::fs::create_dir_all(dir).await?;
    }
    write_new(&full, &upload.bytes).await?;

    tracing::debug!(path = %key, bytes = upload.bytes.len(), "stored image");

    Ok(NoteImage {
      path: key,
      original_name,
      content_hash: content_hash(&upload.bytes),
      media_type: sniff_media_type(&upload.bytes)
        .unwrap_or("application/octet-stream")
        .to_owned(),
    })
  }

  /// Delete the file behind `image` and confirm it is gone. A file that is
  /// already missing counts as removed.
  pub async fn remove(&self, image: &NoteImage) -> io::Result<()> {
    let full = self.resolve(&image.path)?;
    match tokio::fs::remove_file(&full).await {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => return Err(e),
    }
    if tokio::fs::try_exists(&full).await? {
      return Err(io::Error::other(format!(
        "image {} still present after removal",
        image.path
      )));
    }
    tracing::debug!(path = %image.path, "removed image");
    Ok(())
  }

  /// Remove without failing the caller; used for cleanup after the database
  /// has already committed (or refused) the change.
  pub async fn remove_logged(&self, image: &NoteImage) {
    if let Err(e) = self.remove(image).await {
      tracing::warn!(path = %image.path, error = %e, "failed to remove image");
    }
  }

  pub async fn read(&self, image: &NoteImage) -> io::Result<Bytes> {
    let full = self.resolve(&image.path)?;
    Ok(Bytes::from(tokio::fs::read(full).await?))
  }

  /// Absolute path for a storage key. Keys are generated by [`store`] but
  /// come back from the database, so refuse anything escaping the root.
  ///
  /// [`store`]: MediaRoot::store
  pub fn resolve(&self, key: &str) -> io::Result<PathBuf> {
    let rel = Path::new(key);
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("invalid media key {key:?}"),
      ));
    }
    Ok(self.root.join(rel))
  }
}

/// SHA-256 hex digest of `bytes`.
/// Write `bytes` to `full`. A failed write removes whatever part of the file
/// it left behind.
async fn write_new(full: &Path, bytes: &[u8]) -> io::Result<()> {
  let Err(e) = tokio::fs::write(full, bytes).await else {
    return Ok(());
  };
  if let Err(cleanup) = tokio::fs::remove_file(full).await
    && cleanup.kind() != io::ErrorKind::NotFound
  {
    tracing::warn!(path = %full.display(), error = %cleanup, "failed to remove partial image");
  }
  Err(e)
}

pub fn content_hash(bytes: &[u8]) -> String { hex::encode(Sha256::digest(bytes)) }

/// Identify an image format from its leading bytes.
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
  if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
    Some("image/jpeg")
  } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
    Some("image/png")
  } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
    Some("image/gif")
  } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
    Some("image/webp")
  } else {
    None
  }
}

/// Reduce an uploaded filename to a safe final path segment.
pub fn sanitize_file_name(name: &str) -> String {
  let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
  let cleaned: String = base
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
        c
      } else {
        '_'
      }
    })
    .take(100)
    .collect();
  let cleaned = cleaned.trim_start_matches('.');
  if cleaned.is_empty() {
    "image".to_owned()
  } else {
    cleaned.to_owned()
  }
}
