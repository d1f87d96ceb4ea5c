//! Saved and auto-synced playlists.
//!
//! Saved playlists go through the reconcile engine keyed by browse id; each
//! linked playlist then has its contents mirrored. Auto-sync playlists are
//! local playlists flagged for refresh: only their contents are mirrored,
//! with no membership diff.

use crate::context::SyncContext;
use crate::error::Result;
use crate::generation::GenerationGuard;
use crate::playlist_content::{content_report, sync_playlist_content};
use crate::reconcile::{changed, collect_items, EntitySection};
use crate::report::{Section, SectionReport};
use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{RemoteCatalog, RemotePlaylist};
use core_async::sync::Mutex;
use core_async::task::JoinSet;
use core_library::{LibraryStore, PlaylistEntity};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

type LibraryResult<T> = core_library::Result<T>;

pub(crate) struct SavedPlaylists {
    /// Browse ids to mirror; empty means every saved playlist
    selected: BTreeSet<String>,
    /// Browse ids whose contents this pass already reconciled
    content_synced: Mutex<BTreeSet<String>>,
}

impl SavedPlaylists {
    pub fn new(selected: BTreeSet<String>) -> Self {
        Self {
            selected,
            content_synced: Mutex::new(BTreeSet::new()),
        }
    }

    pub async fn content_synced(&self) -> BTreeSet<String> {
        self.content_synced.lock().await.clone()
    }

    fn wants(&self, playlist: &RemotePlaylist) -> bool {
        !playlist.is_system() && (self.selected.is_empty() || self.selected.contains(&playlist.id))
    }
}

#[async_trait]
impl EntitySection for SavedPlaylists {
    type Remote = RemotePlaylist;
    type Local = PlaylistEntity;

    const SECTION: Section = Section::SavedPlaylists;

    async fn fetch(&self, catalog: &dyn RemoteCatalog) -> BridgeResult<Vec<RemotePlaylist>> {
        let playlists = catalog.fetch_saved_playlists().await?;
        Ok(playlists
            .into_iter()
            .filter(|playlist| self.wants(playlist))
            .collect())
    }

    fn remote_key(remote: &RemotePlaylist) -> &str {
        &remote.id
    }

    async fn linked(&self, store: &dyn LibraryStore) -> LibraryResult<Vec<PlaylistEntity>> {
        Ok(store
            .playlists()
            .await?
            .into_iter()
            .filter(|playlist| playlist.browse_id.is_some() && playlist.is_bookmarked())
            .collect())
    }

    fn unlink(local: &PlaylistEntity) -> Option<PlaylistEntity> {
        local.is_bookmarked().then(|| PlaylistEntity {
            bookmarked_at: None,
            ..local.clone()
        })
    }

    fn merge(
        &self,
        existing: Option<&PlaylistEntity>,
        remote: &RemotePlaylist,
        _rank: i64,
        linked_at: i64,
    ) -> Option<PlaylistEntity> {
        let mut playlist = existing.cloned().unwrap_or_else(|| {
            let mut playlist = PlaylistEntity::new(&remote.title, linked_at);
            playlist.browse_id = Some(remote.id.clone());
            playlist
        });
        playlist.name = remote.title.clone();
        playlist.author = remote.author.clone();
        playlist.song_count = remote.song_count;
        playlist.thumbnail_url = remote.thumbnail_url.clone();
        playlist.is_editable = remote.is_editable;
        playlist.bookmarked_at = Some(playlist.bookmarked_at.unwrap_or(linked_at));
        changed(existing, playlist)
    }

    async fn after_upsert(
        &self,
        ctx: &Arc<SyncContext>,
        guard: &GenerationGuard,
        local: &PlaylistEntity,
    ) -> Option<SectionReport> {
        let browse_id = local.browse_id.as_deref()?;
        let result = sync_playlist_content(ctx, guard, browse_id, &local.id).await;
        if result.is_ok() {
            self.content_synced
                .lock()
                .await
                .insert(browse_id.to_string());
        }
        Some(content_report(browse_id, result))
    }
}

/// Refresh the contents of every auto-sync playlist whose browse id is not
/// in `already_synced`.
#[instrument(skip_all, fields(generation = guard.generation()))]
pub(crate) async fn sync_auto_playlists(
    ctx: Arc<SyncContext>,
    guard: GenerationGuard,
    already_synced: BTreeSet<String>,
) -> SectionReport {
    let mut report = SectionReport::new(Section::AutoSyncPlaylists);

    let playlists = match ctx.store.auto_sync_playlists().await {
        Ok(playlists) => playlists,
        Err(e) => {
            warn!(error = %e, "Failed to list auto-sync playlists");
            report.failed += 1;
            return report;
        }
    };
    debug!(count = playlists.len(), "Refreshing auto-sync playlists");

    let mut tasks: JoinSet<Result<SectionReport>> = JoinSet::new();
    for playlist in playlists {
        let Some(browse_id) = playlist.browse_id.clone() else {
            continue;
        };
        if already_synced.contains(&browse_id) {
            continue;
        }
        let ctx = Arc::clone(&ctx);
        let guard = guard.clone();
        tasks.spawn(async move {
            let result = sync_playlist_content(&ctx, &guard, &browse_id, &playlist.id).await;
            Ok(content_report(&browse_id, result))
        });
    }
    collect_items(&mut report, tasks).await;
    report
}
