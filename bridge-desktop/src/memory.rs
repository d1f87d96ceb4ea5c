//! Process-local Secure Store

use async_trait::async_trait;
use bridge_traits::{error::Result, storage::SecureStore};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// [`SecureStore`] that keeps secrets in memory for the life of the process.
///
/// Used on machines without a keychain (CI, containers) and as the default
/// in tests. Nothing survives a restart, so a fresh process always starts
/// signed out.
#[derive(Default)]
pub struct MemorySecureStore {
    secrets: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        self.secrets
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        debug!(key, "Stored secret in memory");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.secrets.read().await.get(key).cloned())
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        self.secrets.write().await.remove(key);
        Ok(())
    }

    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.secrets.read().await.contains_key(key))
    }
}
