use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{Category, Storage, StorageError};

/// File-backed record store: one JSON document per record under
/// `<base_dir>/<category>/<key>.json`.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn record_path(&self, category: Category, key: &str) -> PathBuf {
        self.base_dir
            .join(category.as_str())
            .join(format!("{}.json", key))
    }

    async fn ensure_category_dir(&self, category: Category) -> Result<PathBuf, StorageError> {
        let dir = self.base_dir.join(category.as_str());
        fs::create_dir_all(&dir).await.map_err(io_error)?;
        Ok(dir)
    }
}

fn io_error(err: std::io::Error) -> StorageError {
    StorageError::Io(err.to_string())
}

async fn write_json(path: &Path, record: &Value) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(record).map_err(|e| StorageError::Io(e.to_string()))?;
    fs::write(path, bytes).await.map_err(io_error)
}

#[async_trait]
impl Storage for FileStore {
    async fn create(&self, category: Category, key: &str, record: Value) -> Result<(), StorageError> {
        self.ensure_category_dir(category).await?;
        let path = self.record_path(category, key);

        // create_new gives per-record atomicity for the uniqueness invariant
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists)
            }
            Err(err) => return Err(io_error(err)),
        };

        let bytes = serde_json::to_vec(&record).map_err(|e| StorageError::Io(e.to_string()))?;
        file.write_all(&bytes).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)
    }

    async fn read(&self, category: Category, key: &str) -> Result<Value, StorageError> {
        let path = self.record_path(category, key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound),
            Err(err) => return Err(io_error(err)),
        };
        serde_json::from_slice(&bytes).map_err(|e| StorageError::Io(e.to_string()))
    }

    async fn update(&self, category: Category, key: &str, record: Value) -> Result<(), StorageError> {
        let path = self.record_path(category, key);
        match fs::metadata(&path).await {
            Ok(_) => write_json(&path, &record).await,
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(err) => Err(io_error(err)),
        }
    }

    async fn delete(&self, category: Category, key: &str) -> Result<(), StorageError> {
        let path = self.record_path(category, key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(err) => Err(io_error(err)),
        }
    }

    async fn list(&self, category: Category) -> Result<Vec<String>, StorageError> {
        let dir = self.base_dir.join(category.as_str());
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            // A category nobody has written to yet is just empty
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(err)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let name = entry.file_name();
            if let Some(key) = name.to_str().and_then(|n| n.strip_suffix(".json")) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }
}
