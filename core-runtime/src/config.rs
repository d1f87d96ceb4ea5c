//! # Core Configuration Module
//!
//! Builder-constructed [`CoreConfig`] holding the host-provided bridges and
//! the engine's tunables. Validation is fail-fast: a missing bridge is
//! reported with [`Error::CapabilityMissing`] before anything is opened.
//!
//! ## Required Dependencies
//!
//! - `SecureStore` - holds the session credential ("logged in")
//! - `SettingsStore` - holds the sync preferences
//!
//! With the `desktop-shims` feature, a SQLite settings store next to the
//! library database and an in-memory secure store are injected when the host
//! does not provide them; `keychain` swaps the latter for the OS keychain.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/data/library.db")
//!     .secure_store(Arc::new(MySecureStore))
//!     .settings_store(Arc::new(MySettingsStore))
//!     .max_concurrent_writes(2)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{Clock, SecureStore, SettingsStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;

/// Write transactions the store accepts at once unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENT_WRITES: usize = 2;

/// Upper bound for `max_concurrent_writes`; SQLite serializes writers anyway.
const MAX_CONCURRENT_WRITES_LIMIT: usize = 16;

/// Where the library database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    /// Private in-memory database, gone when the process exits
    InMemory,
}

/// Engine configuration. Use [`CoreConfig::builder`] to construct.
#[derive(Clone)]
pub struct CoreConfig {
    pub database: DatabaseLocation,

    /// Session credential storage (required)
    pub secure_store: Arc<dyn SecureStore>,

    /// Preference storage (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Time source for liked/bookmarked timestamps
    pub clock: Arc<dyn Clock>,

    /// Cap on concurrent local-store write transactions
    pub max_concurrent_writes: usize,

    /// Event bus buffer per subscriber
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database", &self.database)
            .field("max_concurrent_writes", &self.max_concurrent_writes)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish_non_exhaustive()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Checks the tunables; bridges are guaranteed present by the type.
    pub fn validate(&self) -> Result<()> {
        if let DatabaseLocation::File(path) = &self.database {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        if self.max_concurrent_writes == 0 {
            return Err(Error::Config(
                "max_concurrent_writes must be at least 1".to_string(),
            ));
        }

        if self.max_concurrent_writes > MAX_CONCURRENT_WRITES_LIMIT {
            return Err(Error::Config(format!(
                "max_concurrent_writes exceeds the limit of {}",
                MAX_CONCURRENT_WRITES_LIMIT
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn secure_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SecureStore".to_string(),
        message: "SecureStore implementation is required to hold the session credential. \
                 Desktop: enable the 'desktop-shims' (or 'keychain') feature. \
                 Mobile: inject platform-native secure storage (Keychain/Keystore)."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for sync preferences. \
                 Desktop: enable the 'desktop-shims' feature to use SqliteSettingsStore. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore)."
            .to_string(),
    }
}

#[cfg(feature = "keychain")]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Ok(Arc::new(bridge_desktop::KeyringSecureStore::new()))
}

#[cfg(all(feature = "desktop-shims", not(feature = "keychain")))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Ok(Arc::new(bridge_desktop::MemorySecureStore::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Err(secure_store_missing_error())
}

/// Opens the default settings store on a dedicated runtime; the builder is
/// synchronous and may itself be called from inside a runtime.
#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(database: &DatabaseLocation) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;

    let location = match database {
        DatabaseLocation::File(path) => Some(
            path.parent()
                .map(|parent| parent.join("settings.db"))
                .unwrap_or_else(|| PathBuf::from("settings.db")),
        ),
        DatabaseLocation::InMemory => None,
    };

    let open = move || -> Result<SqliteSettingsStore> {
        let runtime = core_async::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create runtime for default settings store: {}",
                    e
                ))
            })?;

        runtime
            .block_on(async {
                match location {
                    Some(path) => SqliteSettingsStore::new(path).await,
                    None => SqliteSettingsStore::in_memory().await,
                }
            })
            .map_err(|e| Error::Internal(format!("Failed to open default SettingsStore: {}", e)))
    };

    let store = if core_async::runtime::in_runtime() {
        std::thread::spawn(open).join().map_err(|_| {
            Error::Internal("Settings store initialization thread panicked".to_string())
        })??
    } else {
        open()?
    };

    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_database: &DatabaseLocation) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database: Option<DatabaseLocation>,
    secure_store: Option<Arc<dyn SecureStore>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    clock: Option<Arc<dyn Clock>>,
    max_concurrent_writes: Option<usize>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Library database file (required unless [`in_memory`](Self::in_memory))
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database = Some(DatabaseLocation::File(path.into()));
        self
    }

    /// Use a private in-memory library database
    pub fn in_memory(mut self) -> Self {
        self.database = Some(DatabaseLocation::InMemory);
        self
    }

    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Defaults to [`SystemClock`]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults to [`DEFAULT_MAX_CONCURRENT_WRITES`]
    pub fn max_concurrent_writes(mut self, permits: usize) -> Self {
        self.max_concurrent_writes = Some(permits);
        self
    }

    /// Defaults to [`DEFAULT_EVENT_BUFFER_SIZE`]
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when no database location was set or a tunable is
    ///   out of range
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and
    ///   no desktop default is compiled in
    pub fn build(self) -> Result<CoreConfig> {
        let database = self.database.ok_or_else(|| {
            Error::Config(
                "Database location is required. Use .database_path() or .in_memory().".to_string(),
            )
        })?;

        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store()?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(&database)?,
        };

        let config = CoreConfig {
            database,
            secure_store,
            settings_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            max_concurrent_writes: self
                .max_concurrent_writes
                .unwrap_or(DEFAULT_MAX_CONCURRENT_WRITES),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;

    struct NullSecureStore;

    #[async_trait]
    impl SecureStore for NullSecureStore {
        async fn set_secret(&self, _key: &str, _value: &[u8]) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_secret(&self, _key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn delete_secret(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct NullSettingsStore;

    #[async_trait]
    impl SettingsStore for NullSettingsStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Ok(None)
        }

        async fn set_bool(&self, _key: &str, _value: bool) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_bool(&self, _key: &str) -> BridgeResult<Option<bool>> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn has_key(&self, _key: &str) -> BridgeResult<bool> {
            Ok(false)
        }
    }

    fn with_bridges() -> CoreConfigBuilder {
        CoreConfig::builder()
            .secure_store(Arc::new(NullSecureStore))
            .settings_store(Arc::new(NullSettingsStore))
    }

    #[test]
    fn test_defaults_applied() {
        let config = with_bridges().database_path("/tmp/library.db").build().unwrap();

        assert_eq!(
            config.database,
            DatabaseLocation::File(PathBuf::from("/tmp/library.db"))
        );
        assert_eq!(config.max_concurrent_writes, DEFAULT_MAX_CONCURRENT_WRITES);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
    }

    #[test]
    fn test_database_location_required() {
        let err = with_bridges().build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_path_rejected() {
        let err = with_bridges().database_path("").build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_write_concurrency_bounds() {
        assert!(with_bridges()
            .in_memory()
            .max_concurrent_writes(0)
            .build()
            .is_err());
        assert!(with_bridges()
            .in_memory()
            .max_concurrent_writes(MAX_CONCURRENT_WRITES_LIMIT + 1)
            .build()
            .is_err());
        assert_eq!(
            with_bridges()
                .in_memory()
                .max_concurrent_writes(4)
                .build()
                .unwrap()
                .max_concurrent_writes,
            4
        );
    }

    #[test]
    fn test_zero_event_buffer_rejected() {
        assert!(with_bridges()
            .in_memory()
            .event_buffer_size(0)
            .build()
            .is_err());
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_bridges_reported() {
        let err = CoreConfig::builder().in_memory().build().unwrap_err();
        match err {
            Error::CapabilityMissing { capability, .. } => assert_eq!(capability, "SecureStore"),
            other => panic!("unexpected error: {:?}", other),
        }

        let err = CoreConfig::builder()
            .in_memory()
            .secure_store(Arc::new(NullSecureStore))
            .build()
            .unwrap_err();
        match err {
            Error::CapabilityMissing { capability, .. } => assert_eq!(capability, "SettingsStore"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_injected() {
        let config = CoreConfig::builder().in_memory().build().unwrap();
        assert_eq!(config.database, DatabaseLocation::InMemory);
    }
}
