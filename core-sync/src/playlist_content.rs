//! # Playlist Content Syncer
//!
//! Mirrors the ordered contents of one playlist. The local order is
//! rewritten only when it differs from the remote order, and then in a
//! single transaction: clear every entry, insert songs not yet known,
//! re-insert entries with `position = index`.
//!
//! Entries compare by song id and `set_video_id`, so a song removed and
//! re-added at the same index is rewritten too. An empty remote result is
//! treated as "unknown" and never empties the local playlist.

use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::generation::GenerationGuard;
use crate::report::{Section, SectionReport};
use crate::sections::new_song;
use core_library::PlaylistSongMap;
use core_runtime::events::{CoreEvent, LibraryEvent};
use tracing::{debug, info, instrument, warn};

/// What a content pass did to one playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOutcome {
    /// Local order already matched
    Unchanged,
    /// The remote returned no entries; nothing was touched
    RemoteEmpty,
    Replaced {
        entries: usize,
        songs_inserted: u64,
    },
}

/// Reconcile the contents of `playlist_id` with remote playlist `browse_id`.
#[instrument(skip(ctx, guard), fields(generation = guard.generation()))]
pub(crate) async fn sync_playlist_content(
    ctx: &SyncContext,
    guard: &GenerationGuard,
    browse_id: &str,
    playlist_id: &str,
) -> Result<ContentOutcome> {
    let _lock = ctx.governor.lock_playlist(playlist_id).await;

    let remote = ctx
        .catalog
        .fetch_playlist_contents(browse_id)
        .await
        .map_err(SyncError::Remote)?;
    if remote.is_empty() {
        debug!("Remote playlist came back empty; keeping local contents");
        return Ok(ContentOutcome::RemoteEmpty);
    }
    guard.ensure_live()?;

    let local = ctx.store.playlist_songs(playlist_id).await?;
    let unchanged = local.len() == remote.len()
        && local.iter().zip(&remote).all(|(entry, item)| {
            entry.song_id == item.song.id && entry.set_video_id == item.set_video_id
        });
    if unchanged {
        debug!(entries = local.len(), "Playlist order unchanged");
        return Ok(ContentOutcome::Unchanged);
    }

    let created_at = ctx.now_millis();
    let _permit = ctx.governor.acquire_write().await?;
    guard.ensure_live()?;
    let mut tx = ctx.store.begin().await?;
    guard.ensure_live()?;

    let cleared = tx.clear_playlist(playlist_id).await?;
    let mut songs_inserted = 0;
    for (position, item) in remote.iter().enumerate() {
        if tx.song(&item.song.id).await?.is_none() {
            tx.insert_song(&new_song(&item.song, created_at)).await?;
            songs_inserted += 1;
        }
        tx.insert_playlist_song(&PlaylistSongMap {
            playlist_id: playlist_id.to_string(),
            song_id: item.song.id.clone(),
            position: position as i64,
            set_video_id: item.set_video_id.clone(),
        })
        .await?;
    }
    tx.commit().await?;

    info!(
        cleared,
        entries = remote.len(),
        songs_inserted,
        "Replaced playlist contents"
    );
    ctx.events
        .emit(CoreEvent::Library(LibraryEvent::PlaylistContentReplaced {
            playlist_id: playlist_id.to_string(),
            browse_id: browse_id.to_string(),
            song_count: remote.len() as u32,
        }))
        .ok();

    Ok(ContentOutcome::Replaced {
        entries: remote.len(),
        songs_inserted,
    })
}

/// Fold a content pass into a report: a replaced playlist counts as one
/// update, plus one insert per new song.
pub(crate) fn content_report(browse_id: &str, result: Result<ContentOutcome>) -> SectionReport {
    let mut report = SectionReport::new(Section::PlaylistContent);
    match result {
        Ok(ContentOutcome::Replaced { songs_inserted, .. }) => {
            report.updated += 1;
            report.inserted += songs_inserted;
        }
        Ok(ContentOutcome::Unchanged) | Ok(ContentOutcome::RemoteEmpty) => {}
        Err(e) if e.is_stale() => {
            debug!(browse_id, "Playlist content skipped: generation is stale");
            report.stale = true;
        }
        Err(e) => {
            warn!(browse_id, error = %e, "Playlist content sync failed");
            report.failed += 1;
        }
    }
    report
}
