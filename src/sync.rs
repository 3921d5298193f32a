use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

/// Per-phone serialization for mutations of a user's `checks` list.
///
/// Check creation, check deletion and user cascade deletion all perform a
/// read-modify-write on the owning user record; two such requests for the
/// same phone must not interleave or one rewrite silently overwrites the
/// other. Requests for different phones do not contend.
#[derive(Clone, Default)]
pub struct UserLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding the given phone's check list.
    pub fn for_phone(&self, phone: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(phone.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_phone_shares_a_lock() {
        let locks = UserLocks::new();
        let a = locks.for_phone("5551234567");
        let b = locks.for_phone("5551234567");
        assert!(Arc::ptr_eq(&a, &b));

        let guard = a.lock().await;
        assert!(b.try_lock().is_err());
        drop(guard);
        assert!(b.try_lock().is_ok());
    }

    #[tokio::test]
    async fn different_phones_do_not_contend() {
        let locks = UserLocks::new();
        let a = locks.for_phone("5551234567");
        let b = locks.for_phone("5557654321");

        let _guard = a.lock().await;
        assert!(b.try_lock().is_ok());
    }
}
