//! Sync preferences persisted in the host [`SettingsStore`].

use crate::error::{Result, SyncError};
use bridge_traits::SettingsStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

pub const SYNC_ENABLED_KEY: &str = "library_sync.sync_enabled";
pub const SELECTED_PLAYLISTS_KEY: &str = "library_sync.selected_playlist_ids";

/// Typed accessors over the settings store.
#[derive(Clone)]
pub struct SyncPreferences {
    settings: Arc<dyn SettingsStore>,
}

impl SyncPreferences {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Defaults to `true` when never set.
    pub async fn sync_enabled(&self) -> Result<bool> {
        Ok(self
            .settings
            .get_bool(SYNC_ENABLED_KEY)
            .await
            .map_err(SyncError::Settings)?
            .unwrap_or(true))
    }

    pub async fn set_sync_enabled(&self, enabled: bool) -> Result<()> {
        self.settings
            .set_bool(SYNC_ENABLED_KEY, enabled)
            .await
            .map_err(SyncError::Settings)?;
        debug!(enabled, "Stored sync preference");
        Ok(())
    }

    /// Browse ids of the saved playlists to mirror; empty means all.
    pub async fn selected_playlist_ids(&self) -> Result<BTreeSet<String>> {
        let Some(raw) = self
            .settings
            .get_string(SELECTED_PLAYLISTS_KEY)
            .await
            .map_err(SyncError::Settings)?
        else {
            return Ok(BTreeSet::new());
        };

        serde_json::from_str(&raw).map_err(|e| SyncError::InvalidPreference {
            key: SELECTED_PLAYLISTS_KEY.to_string(),
            message: e.to_string(),
        })
    }

    pub async fn set_selected_playlist_ids(&self, ids: &BTreeSet<String>) -> Result<()> {
        if ids.is_empty() {
            return self
                .settings
                .delete(SELECTED_PLAYLISTS_KEY)
                .await
                .map_err(SyncError::Settings);
        }

        let raw = serde_json::to_string(ids).map_err(|e| SyncError::InvalidPreference {
            key: SELECTED_PLAYLISTS_KEY.to_string(),
            message: e.to_string(),
        })?;
        self.settings
            .set_string(SELECTED_PLAYLISTS_KEY, &raw)
            .await
            .map_err(SyncError::Settings)
    }
}
