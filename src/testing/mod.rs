//! Shared fixtures for unit tests: an in-memory application state, request
//! builders, seeded users/tokens, and a fault-injecting storage wrapper.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use serde_json::Value;

use crate::auth;
use crate::config::{AppConfig, Environment};
use crate::models::{Token, User};
use crate::server::request::RequestData;
use crate::server::AppState;
use crate::storage::memory::MemoryStore;
use crate::storage::{Category, Storage, StorageError};

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        http_port: 0,
        hashing_secret: "unit-test-secret".to_string(),
        max_checks: 5,
        token_ttl_secs: 3600,
        data_dir: PathBuf::from(".data-test"),
    }
}

pub fn state_with(storage: Arc<dyn Storage>) -> AppState {
    AppState::new(test_config(), storage)
}

pub fn memory_state() -> AppState {
    state_with(Arc::new(MemoryStore::new()))
}

/// Store a user (password hashed the way the handlers do) plus a live token
/// for them, and hand both back.
pub async fn seed_user(state: AppState, phone: &str, password: &str) -> (AppState, Token) {
    let user = User {
        phone: phone.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        hashed_password: auth::hash(&state.config.hashing_secret, password),
        tos_agreement: true,
        checks: Vec::new(),
    };
    state
        .storage
        .create(
            Category::Users,
            phone,
            serde_json::to_value(&user).expect("user encodes"),
        )
        .await
        .expect("user stored");

    let token = Token::new(phone, state.config.token_ttl_secs);
    state
        .storage
        .create(
            Category::Tokens,
            &token.id,
            serde_json::to_value(&token).expect("token encodes"),
        )
        .await
        .expect("token stored");

    (state, token)
}

pub async fn seeded_state(phone: &str, password: &str) -> (AppState, Token) {
    seed_user(memory_state(), phone, password).await
}

/// Hand-built canonical request, bypassing the HTTP layer.
pub fn test_request(
    method: &str,
    path: &str,
    query: &[(&str, &str)],
    payload: Value,
    token: Option<&str>,
) -> RequestData {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        if let Ok(value) = HeaderValue::from_str(token) {
            headers.insert("token", value);
        }
    }
    RequestData {
        path: path.to_string(),
        method: method.to_string(),
        query: query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
        headers,
        payload,
    }
}

/// Storage operations a `FaultStore` can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Read,
    Update,
    Delete,
}

/// A `MemoryStore` wrapper that fails selected operations with an I/O
/// error, for exercising partial-failure and compensation paths.
pub struct FaultStore {
    inner: MemoryStore,
    faults: Mutex<HashSet<(Op, Category, String)>>,
}

impl FaultStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            faults: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail(&self, op: Op, category: Category, key: &str) {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((op, category, key.to_string()));
    }

    fn injected(&self, op: Op, category: Category, key: &str) -> Option<StorageError> {
        let faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        faults
            .contains(&(op, category, key.to_string()))
            .then(|| StorageError::Io("injected fault".to_string()))
    }
}

impl Default for FaultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for FaultStore {
    async fn create(&self, category: Category, key: &str, record: Value) -> Result<(), StorageError> {
        if let Some(err) = self.injected(Op::Create, category, key) {
            return Err(err);
        }
        self.inner.create(category, key, record).await
    }

    async fn read(&self, category: Category, key: &str) -> Result<Value, StorageError> {
        if let Some(err) = self.injected(Op::Read, category, key) {
            return Err(err);
        }
        self.inner.read(category, key).await
    }

    async fn update(&self, category: Category, key: &str, record: Value) -> Result<(), StorageError> {
        if let Some(err) = self.injected(Op::Update, category, key) {
            return Err(err);
        }
        self.inner.update(category, key, record).await
    }

    async fn delete(&self, category: Category, key: &str) -> Result<(), StorageError> {
        if let Some(err) = self.injected(Op::Delete, category, key) {
            return Err(err);
        }
        self.inner.delete(category, key).await
    }

    async fn list(&self, category: Category) -> Result<Vec<String>, StorageError> {
        self.inner.list(category).await
    }
}
