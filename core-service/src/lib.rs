//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided bridges from a [`CoreConfig`] and the
//! host's [`RemoteCatalog`] client into the sync engine: the library
//! database, the session manager, the event bus and the sync coordinator.
//! Desktop apps typically enable the `desktop-shims` feature so missing
//! settings/secure stores fall back to the `bridge-desktop` implementations.
//!
//! ```ignore
//! use core_service::{CoreConfig, LibrarySyncService};
//!
//! let config = CoreConfig::builder().database_path("/data/library.db").build()?;
//! let service = LibrarySyncService::bootstrap(config, catalog).await?;
//! service.sign_in(SessionCredential::new(cookie)?).await?;
//! service.perform_full_sync().await;
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_runtime::{CoreConfig, CoreConfigBuilder, DatabaseLocation};

use std::sync::Arc;

use bridge_traits::RemoteCatalog;
use core_auth::{SessionCredential, SessionManager};
use core_library::db::{create_pool, DatabaseConfig};
use core_library::{LibraryStore, SqliteLibraryStore};
use core_runtime::events::{CoreEvent, EventBus, Receiver};
use core_sync::{SyncConfig, SyncCoordinator, SyncReport};
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct LibrarySyncService {
    store: Arc<SqliteLibraryStore>,
    session: Arc<SessionManager>,
    coordinator: Arc<SyncCoordinator>,
    events: EventBus,
}

impl LibrarySyncService {
    /// Open the library database and wire the engine.
    pub async fn bootstrap(config: CoreConfig, catalog: Arc<dyn RemoteCatalog>) -> Result<Self> {
        config.validate()?;

        let database = match &config.database {
            DatabaseLocation::File(path) => DatabaseConfig::new(path.clone()),
            DatabaseLocation::InMemory => DatabaseConfig::in_memory(),
        };
        let pool = create_pool(database).await?;
        let store = Arc::new(SqliteLibraryStore::new(pool));

        let events = EventBus::new(config.event_buffer_size);
        let session = Arc::new(SessionManager::new(
            Arc::clone(&config.secure_store),
            events.clone(),
        ));
        let coordinator = SyncCoordinator::new(
            SyncConfig {
                max_concurrent_writes: config.max_concurrent_writes,
            },
            catalog,
            store.clone(),
            session.clone(),
            Arc::clone(&config.settings_store),
            Arc::clone(&config.clock),
            events.clone(),
        );

        info!(database = ?config.database, "Library sync service ready");
        Ok(Self {
            store,
            session,
            coordinator: Arc::new(coordinator),
            events,
        })
    }

    /// Store the session credential and allow sync passes.
    pub async fn sign_in(&self, credential: SessionCredential) -> Result<()> {
        self.session.sign_in(credential).await?;
        self.coordinator.on_signed_in();
        Ok(())
    }

    /// Stop in-flight passes from writing, then drop the credential.
    pub async fn sign_out(&self) -> Result<()> {
        self.coordinator.on_signed_out();
        self.session.sign_out().await?;
        Ok(())
    }

    pub async fn perform_full_sync(&self) -> Option<SyncReport> {
        self.coordinator.perform_full_sync().await
    }

    pub async fn like_song(&self, song_id: &str, liked: bool) -> Result<()> {
        Ok(self.coordinator.like_song(song_id, liked).await?)
    }

    pub async fn set_sync_enabled(&self, enabled: bool) -> Result<()> {
        Ok(self.coordinator.set_sync_enabled(enabled).await?)
    }

    pub fn coordinator(&self) -> Arc<SyncCoordinator> {
        Arc::clone(&self.coordinator)
    }

    pub fn session(&self) -> Arc<SessionManager> {
        Arc::clone(&self.session)
    }

    /// Read access to the mirrored library.
    pub fn library(&self) -> Arc<dyn LibraryStore> {
        self.store.clone()
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }
}
