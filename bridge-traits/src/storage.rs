//! Credential and Preference Storage
//!
//! Two small key-value contracts the host provides:
//!
//! - [`SecureStore`] holds the session credential; its presence is what
//!   "logged in" means to the sync engine.
//! - [`SettingsStore`] holds user preferences such as whether library sync is
//!   enabled and which playlists to mirror.

use async_trait::async_trait;

use crate::error::Result;

/// Secure credential storage
///
/// Backed by the platform keychain on desktop and mobile. Values are opaque
/// bytes and must never be logged.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// async fn has_session(store: &dyn SecureStore) -> bool {
///     store.has_secret("session_credential").await.unwrap_or(false)
/// }
/// ```
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, replacing any previous value
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret; deleting a missing key is not an error
    async fn delete_secret(&self, key: &str) -> Result<()>;

    /// Check if a secret exists without retrieving it
    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }
}

/// Key-value preference storage
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn disable_sync(store: &dyn SettingsStore) -> Result<()> {
///     store.set_bool("library_sync.enabled", false).await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool>;
}
