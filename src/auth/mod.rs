use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::models::Token;
use crate::storage::{Category, Storage};

type HmacSha256 = Hmac<Sha256>;

/// Keyed digest of a secret value, hex encoded. Deterministic for equal
/// `(secret, input)` pairs; this is what gets stored in place of passwords.
pub fn hash(secret: &str, input: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(input.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric string, used for token and check ids.
pub fn random_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// True only when the token exists, belongs to `phone`, and has not expired.
///
/// All failure cases return a bare `false`; the caller cannot tell a missing
/// token from an expired one or from one owned by someone else.
pub async fn verify_token(storage: &dyn Storage, token_id: &str, phone: &str) -> bool {
    let value = match storage.read(Category::Tokens, token_id).await {
        Ok(value) => value,
        Err(_) => return false,
    };
    let token: Token = match serde_json::from_value(value) {
        Ok(token) => token,
        Err(_) => return false,
    };
    token.phone == phone && !token.is_expired()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use chrono::Utc;

    #[test]
    fn hash_is_deterministic_and_keyed() {
        let a = hash("secret", "password1");
        let b = hash("secret", "password1");
        assert_eq!(a, b);
        // 32-byte digest, hex encoded
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit()));

        assert_ne!(hash("secret", "password2"), a);
        assert_ne!(hash("other-secret", "password1"), a);
        assert_ne!(a, "password1");
    }

    #[test]
    fn random_id_has_expected_shape() {
        let id = random_id(20);
        assert_eq!(id.len(), 20);
        assert!(id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        // Vanishingly unlikely to collide
        assert_ne!(random_id(20), random_id(20));
    }

    async fn store_token(store: &MemoryStore, token: &Token) {
        store
            .create(
                Category::Tokens,
                &token.id,
                serde_json::to_value(token).expect("token encodes"),
            )
            .await
            .expect("token stored");
    }

    #[tokio::test]
    async fn verify_accepts_a_live_matching_token() {
        let store = MemoryStore::new();
        let token = Token::new("5551234567", 3600);
        store_token(&store, &token).await;

        assert!(verify_token(&store, &token.id, "5551234567").await);
    }

    #[tokio::test]
    async fn verify_failures_are_indistinguishable() {
        let store = MemoryStore::new();

        let mut expired = Token::new("5551234567", 3600);
        expired.expires = Utc::now().timestamp_millis();
        store_token(&store, &expired).await;

        let other = Token::new("5550000000", 3600);
        store_token(&store, &other).await;

        // Expired, wrong phone, and absent all come back as a plain false
        assert!(!verify_token(&store, &expired.id, "5551234567").await);
        assert!(!verify_token(&store, &other.id, "5551234567").await);
        assert!(!verify_token(&store, &random_id(20), "5551234567").await);
        assert!(!verify_token(&store, "", "5551234567").await);
    }
}
