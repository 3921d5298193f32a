use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Category, Storage, StorageError};

/// In-memory record store. Used by tests and handy for local experiments;
/// semantics match `FileStore` exactly.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<(Category, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn create(&self, category: Category, key: &str, record: Value) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        let entry = (category, key.to_string());
        if records.contains_key(&entry) {
            return Err(StorageError::AlreadyExists);
        }
        records.insert(entry, record);
        Ok(())
    }

    async fn read(&self, category: Category, key: &str) -> Result<Value, StorageError> {
        self.records
            .read()
            .await
            .get(&(category, key.to_string()))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn update(&self, category: Category, key: &str, record: Value) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        match records.get_mut(&(category, key.to_string())) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete(&self, category: Category, key: &str) -> Result<(), StorageError> {
        self.records
            .write()
            .await
            .remove(&(category, key.to_string()))
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn list(&self, category: Category) -> Result<Vec<String>, StorageError> {
        Ok(self
            .records
            .read()
            .await
            .keys()
            .filter(|(c, _)| *c == category)
            .map(|(_, k)| k.clone())
            .collect())
    }
}
