//! Local filesystem storage implementation.
//!
//! Writes go to a sibling `.tmp` file that is then renamed over the target,
//! so readers never observe a partially written state file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::SeenSet;
use crate::storage::SeenStorage;

/// Seen-set stored as a JSON array in a local file.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Strict read, distinguishing a missing file from a corrupt one.
    pub async fn try_load(&self) -> Result<Option<SeenSet>> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SeenStorage for LocalStorage {
    async fn load(&self) -> SeenSet {
        match self.try_load().await {
            Ok(Some(seen)) => seen,
            Ok(None) => {
                log::info!("No state file at {}; starting fresh", self.path.display());
                SeenSet::new()
            }
            Err(e) => {
                log::warn!(
                    "Could not read state file {}: {}. Treating as empty.",
                    self.path.display(),
                    e
                );
                SeenSet::new()
            }
        }
    }

    async fn save(&self, seen: &SeenSet) -> Result<()> {
        let bytes = serde_json::to_vec(&seen.sorted())?;
        self.write_bytes(&bytes).await?;
        log::debug!("Saved {} id(s) to {}", seen.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("seen.json"));

        assert!(storage.load().await.is_empty());
        assert!(storage.try_load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("seen.json");
        std::fs::write(&path, b"{not json").unwrap();
        let storage = LocalStorage::new(&path);

        assert!(storage.load().await.is_empty());
        assert!(storage.try_load().await.is_err());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("state").join("seen.json"));

        let seen: SeenSet = vec!["b_2".to_string(), "a_1".to_string()].into();
        storage.save(&seen).await.unwrap();

        assert_eq!(storage.load().await, seen);
        let raw = std::fs::read_to_string(storage.path()).unwrap();
        assert_eq!(raw, r#"["a_1","b_2"]"#);
    }

    #[tokio::test]
    async fn test_save_overwrites_and_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("seen.json"));

        storage.save(&vec!["x".to_string()].into()).await.unwrap();
        storage
            .save(&vec!["x".to_string(), "y".to_string()].into())
            .await
            .unwrap();

        assert_eq!(storage.load().await.len(), 2);
        assert!(!storage.tmp_path().exists());
    }

    #[tokio::test]
    async fn test_reads_legacy_unsorted_list_with_duplicates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("seen.json");
        std::fs::write(&path, r#"["z", "a", "z"]"#).unwrap();

        let seen = LocalStorage::new(&path).load().await;
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("z"));
    }
}
