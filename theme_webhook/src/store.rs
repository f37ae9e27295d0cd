use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use types::StoredLatest;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("theme store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize theme: {0}")]
    Serialize(serde_json::Error),
    #[error("stored theme is corrupt: {0}")]
    Corrupt(serde_json::Error),
}

/// Durable single-slot storage for the latest accepted theme.
///
/// The slot is one JSON document on the local filesystem. Every `put`
/// writes a private temporary file next to it and renames it over the
/// target, so readers see either the previous document or the new one
/// and never a torn write. Concurrent writers race; whichever rename lands
/// last wins.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized or written.
    pub async fn put(&self, latest: &StoredLatest) -> Result<(), StoreError> {
        let contents =
            serde_json::to_vec_pretty(latest).map_err(StoreError::Serialize)?;

        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();

        if let Err(e) = write_synced(&temp_path, &contents).await {
            remove_quietly(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            remove_quietly(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    /// Read the stored document. `Ok(None)` means nothing has been stored
    /// yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read or
    /// parsed.
    pub async fn get(&self) -> Result<Option<StoredLatest>, StoreError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(StoreError::Corrupt)
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "theme".into(), |name| name.to_string_lossy());

        self.path.with_file_name(format!(
            ".{file_name}.{id}.tmp",
            id = uuid::Uuid::now_v7()
        ))
    }
}

async fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!("failed to remove temporary file: {e}");
    }
}
