pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Record categories. Each maps to a namespace in the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Users,
    Tokens,
    Checks,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Users => "users",
            Category::Tokens => "tokens",
            Category::Checks => "checks",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record already exists")]
    AlreadyExists,

    #[error("record not found")]
    NotFound,

    #[error("storage I/O failure: {0}")]
    Io(String),
}

/// Keyed record store. Operations are atomic per record; there is no
/// cross-record transaction support, so multi-record consistency is the
/// caller's responsibility.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a new record. Fails with `AlreadyExists` if the key is taken.
    async fn create(&self, category: Category, key: &str, record: Value) -> Result<(), StorageError>;

    async fn read(&self, category: Category, key: &str) -> Result<Value, StorageError>;

    /// Replace an existing record. Fails with `NotFound` if absent.
    async fn update(&self, category: Category, key: &str, record: Value) -> Result<(), StorageError>;

    async fn delete(&self, category: Category, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored under the category.
    async fn list(&self, category: Category) -> Result<Vec<String>, StorageError>;
}
