use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth;

/// Bearer credential binding a random id to a phone and an absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub phone: String,
    /// Unix milliseconds. The token is valid while `now < expires`.
    pub expires: i64,
}

impl Token {
    pub const ID_LEN: usize = 20;

    /// Fresh token for the given phone, expiring `ttl_secs` from now.
    pub fn new(phone: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            id: auth::random_id(Self::ID_LEN),
            phone: phone.into(),
            expires: Utc::now().timestamp_millis() + ttl_secs * 1000,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires <= Utc::now().timestamp_millis()
    }

    /// Reset the expiry to `ttl_secs` from now.
    pub fn extend(&mut self, ttl_secs: i64) {
        self.expires = Utc::now().timestamp_millis() + ttl_secs * 1000;
    }
}

/// Candidate ids from the wire must be exactly the generated length.
pub fn is_valid_token_id(id: &str) -> bool {
    id.len() == Token::ID_LEN
}
