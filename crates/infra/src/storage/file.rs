//! File-backed key/value store
//!
//! One file per key inside a directory. Writes go to a temporary file that
//! is synced and atomically renamed over the target, so a crash leaves
//! either the old or the new value. A `.sha256` sidecar holds the checksum
//! of the last write; a mismatch on read is logged and the value is still
//! returned for the caller to validate.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ferry_core::KeyValueStore;
use ferry_domain::{FerryError, Result};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    directory: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(FerryError::InvalidInput("storage key must not be empty".into()));
        }
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
            .collect();
        Ok(self.directory.join(format!("{file_name}.json")))
    }

    /// True when the stored value matches its checksum sidecar.
    pub async fn verify(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        let Some(data) = read_optional(&path).await? else {
            return Ok(false);
        };
        let Some(expected) = read_optional(&checksum_path(&path)).await? else {
            return Ok(false);
        };
        Ok(checksum(&data) == expected.trim())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        let Some(data) = read_optional(&path).await? else {
            debug!(path = %path.display(), "No stored value");
            return Ok(None);
        };

        if let Some(expected) = read_optional(&checksum_path(&path)).await? {
            if checksum(&data) != expected.trim() {
                warn!(path = %path.display(), "Checksum mismatch, file may be corrupted");
            }
        }

        Ok(Some(data))
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.directory).await.map_err(|e| storage_error(&self.directory, &e))?;

        let temp_path = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .await
            .map_err(|e| storage_error(&temp_path, &e))?;
        file.write_all(value.as_bytes()).await.map_err(|e| storage_error(&temp_path, &e))?;
        file.sync_all().await.map_err(|e| storage_error(&temp_path, &e))?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(storage_error(&path, &e));
        }

        let sidecar = checksum_path(&path);
        if let Err(e) = fs::write(&sidecar, checksum(value)).await {
            warn!(path = %sidecar.display(), error = %e, "Failed to write checksum sidecar");
        }

        debug!(path = %path.display(), "Stored value");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        remove_optional(&path).await?;
        remove_optional(&checksum_path(&path)).await?;
        Ok(())
    }
}

fn checksum_path(path: &Path) -> PathBuf {
    path.with_extension("sha256")
}

fn checksum(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(storage_error(path, &e)),
    }
}

async fn remove_optional(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(storage_error(path, &e)),
    }
}

fn storage_error(path: &Path, err: &std::io::Error) -> FerryError {
    FerryError::Storage(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        store.put("ferry.offline_queue", "[1,2,3]").await.unwrap();

        assert_eq!(store.get("ferry.offline_queue").await.unwrap().as_deref(), Some("[1,2,3]"));
        assert!(store.verify("ferry.offline_queue").await.unwrap());
        assert!(dir.path().join("ferry.offline_queue.json").exists());
        assert!(dir.path().join("ferry.offline_queue.sha256").exists());
    }

    #[tokio::test]
    async fn missing_key_reads_none() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("not-created-yet"));

        assert!(store.get("queue").await.unwrap().is_none());
        store.remove("queue").await.unwrap();
    }

    #[tokio::test]
    async fn overwrite_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        store.put("queue", "first").await.unwrap();
        store.put("queue", "second").await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["queue.json", "queue.sha256"]);
        assert_eq!(store.get("queue").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn tampered_value_fails_verification_but_is_returned() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        store.put("queue", "original").await.unwrap();

        std::fs::write(dir.path().join("queue.json"), "tampered").unwrap();

        assert_eq!(store.get("queue").await.unwrap().as_deref(), Some("tampered"));
        assert!(!store.verify("queue").await.unwrap());
    }

    #[tokio::test]
    async fn remove_deletes_value_and_sidecar() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        store.put("queue", "value").await.unwrap();

        store.remove("queue").await.unwrap();

        assert!(store.get("queue").await.unwrap().is_none());
        assert!(!dir.path().join("queue.sha256").exists());
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let store = FileKeyValueStore::new("/data");
        assert_eq!(store.path_for("a/b c").unwrap(), PathBuf::from("/data/a_b_c.json"));
        assert!(store.path_for("").is_err());
    }
}
