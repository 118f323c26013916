//! Filesystem-backed blob storage for uploaded files.
//!
//! Blobs are addressed by a relative, slash-separated path such as
//! `attachments/{tenant}/{request}/{file}`. The same string is stored on the
//! owning record (e.g. an absence request's `attachment_url`), so the layout
//! of the directory tree mirrors the stored paths.

use crate::errors::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Longest file name kept after sanitising.
const MAX_FILE_NAME: usize = 128;

/// Stores blobs under a root directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

/// Path of an absence-request attachment.
pub fn attachment_path(tenant_id: &str, request_id: &str, file_name: &str) -> Result<String> {
    Ok(format!(
        "attachments/{}/{}/{}",
        validate_segment(tenant_id)?,
        validate_segment(request_id)?,
        sanitize_file_name(file_name)?
    ))
}

/// Path of a user's profile photo.
pub fn profile_photo_path(user_id: &str, file_name: &str) -> Result<String> {
    Ok(format!(
        "profile-photos/{}/{}",
        validate_segment(user_id)?,
        sanitize_file_name(file_name)?
    ))
}

/// Keeps the final component of `file_name` and replaces anything outside
/// `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(file_name: &str) -> Result<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME)
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(Error::invalid("Nombre de archivo inválido"));
    }
    Ok(cleaned)
}

fn validate_segment(segment: &str) -> Result<&str> {
    if segment.is_empty()
        || !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::invalid("Identificador inválido"));
    }
    Ok(segment)
}

impl BlobStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a blob path onto the filesystem, refusing anything that could
    /// escape the root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(Error::invalid("Ruta de archivo inválida"));
        }
        Ok(self.root.join(relative))
    }

    /// Writes `bytes` at `path`, replacing any existing blob.
    pub async fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        debug!(path, size = bytes.len(), "Stored blob");
        Ok(())
    }

    /// Reads the blob at `path`, or `None` when it does not exist.
    pub async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the blob at `path`. Missing blobs are ignored.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                debug!(path, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
