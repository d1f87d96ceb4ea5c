//! # Diff-and-Reconcile Engine
//!
//! The shared algorithm behind every membership section (liked songs,
//! library songs, liked albums, artist subscriptions, saved playlists):
//!
//! 1. Fetch the complete remote collection
//! 2. Unlink local members the remote no longer lists
//! 3. Insert or update every remote member, recording its remote rank
//!
//! Each item is its own task. Items are read through the store first and a
//! transaction is only opened when the item actually needs a write, so an
//! up-to-date library costs zero transactions. The generation is checked
//! before each transaction opens and again right before the write.

use crate::context::SyncContext;
use crate::error::Result;
use crate::generation::GenerationGuard;
use crate::report::{ItemOutcome, Section, SectionReport};
use async_trait::async_trait;
use bridge_traits::RemoteCatalog;
use core_async::task::{join_all_isolated, JoinSet};
use core_library::{
    AlbumEntity, ArtistEntity, LibraryStore, LibraryTransaction, PlaylistEntity, SongEntity,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, instrument, trace, warn};

type LibraryResult<T> = core_library::Result<T>;

/// A local entity type the engine can read and write by its remote key.
#[async_trait]
pub(crate) trait Mirrored: Clone + PartialEq + Send + Sync + 'static {
    const KIND: &'static str;

    /// Key shared with the remote item
    fn key(&self) -> &str;

    async fn load(store: &dyn LibraryStore, key: &str) -> LibraryResult<Option<Self>>;

    async fn load_in(tx: &mut dyn LibraryTransaction, key: &str) -> LibraryResult<Option<Self>>;

    async fn insert(&self, tx: &mut dyn LibraryTransaction) -> LibraryResult<()>;

    async fn update(&self, tx: &mut dyn LibraryTransaction) -> LibraryResult<()>;
}

#[async_trait]
impl Mirrored for SongEntity {
    const KIND: &'static str = "song";

    fn key(&self) -> &str {
        &self.id
    }

    async fn load(store: &dyn LibraryStore, key: &str) -> LibraryResult<Option<Self>> {
        store.song(key).await
    }

    async fn load_in(tx: &mut dyn LibraryTransaction, key: &str) -> LibraryResult<Option<Self>> {
        tx.song(key).await
    }

    async fn insert(&self, tx: &mut dyn LibraryTransaction) -> LibraryResult<()> {
        tx.insert_song(self).await
    }

    async fn update(&self, tx: &mut dyn LibraryTransaction) -> LibraryResult<()> {
        tx.update_song(self).await
    }
}

#[async_trait]
impl Mirrored for AlbumEntity {
    const KIND: &'static str = "album";

    fn key(&self) -> &str {
        &self.id
    }

    async fn load(store: &dyn LibraryStore, key: &str) -> LibraryResult<Option<Self>> {
        store.album(key).await
    }

    async fn load_in(tx: &mut dyn LibraryTransaction, key: &str) -> LibraryResult<Option<Self>> {
        tx.album(key).await
    }

    async fn insert(&self, tx: &mut dyn LibraryTransaction) -> LibraryResult<()> {
        tx.insert_album(self).await
    }

    async fn update(&self, tx: &mut dyn LibraryTransaction) -> LibraryResult<()> {
        tx.update_album(self).await
    }
}

#[async_trait]
impl Mirrored for ArtistEntity {
    const KIND: &'static str = "artist";

    fn key(&self) -> &str {
        &self.id
    }

    async fn load(store: &dyn LibraryStore, key: &str) -> LibraryResult<Option<Self>> {
        store.artist(key).await
    }

    async fn load_in(tx: &mut dyn LibraryTransaction, key: &str) -> LibraryResult<Option<Self>> {
        tx.artist(key).await
    }

    async fn insert(&self, tx: &mut dyn LibraryTransaction) -> LibraryResult<()> {
        tx.insert_artist(self).await
    }

    async fn update(&self, tx: &mut dyn LibraryTransaction) -> LibraryResult<()> {
        tx.update_artist(self).await
    }
}

/// Playlists are matched on their remote browse id.
#[async_trait]
impl Mirrored for PlaylistEntity {
    const KIND: &'static str = "playlist";

    fn key(&self) -> &str {
        self.browse_id.as_deref().unwrap_or(&self.id)
    }

    async fn load(store: &dyn LibraryStore, key: &str) -> LibraryResult<Option<Self>> {
        store.playlist_by_browse_id(key).await
    }

    async fn load_in(tx: &mut dyn LibraryTransaction, key: &str) -> LibraryResult<Option<Self>> {
        tx.playlist_by_browse_id(key).await
    }

    async fn insert(&self, tx: &mut dyn LibraryTransaction) -> LibraryResult<()> {
        tx.insert_playlist(self).await
    }

    async fn update(&self, tx: &mut dyn LibraryTransaction) -> LibraryResult<()> {
        tx.update_playlist(self).await
    }
}

/// One membership section of the library.
#[async_trait]
pub(crate) trait EntitySection: Send + Sync + 'static {
    type Remote: Send + Sync + 'static;
    type Local: Mirrored;

    const SECTION: Section;

    /// The complete remote collection, in remote order
    async fn fetch(
        &self,
        catalog: &dyn RemoteCatalog,
    ) -> bridge_traits::error::Result<Vec<Self::Remote>>;

    fn remote_key(remote: &Self::Remote) -> &str;

    /// Local rows currently linked to this section
    async fn linked(&self, store: &dyn LibraryStore) -> LibraryResult<Vec<Self::Local>>;

    /// The row with its link cleared, or `None` if it is already unlinked
    fn unlink(local: &Self::Local) -> Option<Self::Local>;

    /// The row as it should be after mirroring `remote`, or `None` when
    /// `existing` already matches. `linked_at` is the pass timestamp.
    fn merge(
        &self,
        existing: Option<&Self::Local>,
        remote: &Self::Remote,
        rank: i64,
        linked_at: i64,
    ) -> Option<Self::Local>;

    /// Follow-up work for a row that is now linked.
    async fn after_upsert(
        &self,
        _ctx: &Arc<SyncContext>,
        _guard: &GenerationGuard,
        _local: &Self::Local,
    ) -> Option<SectionReport> {
        None
    }
}

/// `Some(desired)` when it differs from `existing`.
pub(crate) fn changed<E: PartialEq>(existing: Option<&E>, desired: E) -> Option<E> {
    (existing != Some(&desired)).then_some(desired)
}

/// Bring one row in line with `plan`.
///
/// `plan` maps the current row to the desired one (or `None` for "leave
/// it"). It runs once against a pool read and again inside the
/// transaction, so a row changed in between is never overwritten blindly.
/// Returns the outcome plus the row as it now stands.
pub(crate) async fn write_item<E, F>(
    ctx: &SyncContext,
    guard: &GenerationGuard,
    key: &str,
    on_update: ItemOutcome,
    plan: F,
) -> Result<(ItemOutcome, Option<E>)>
where
    E: Mirrored,
    F: Fn(Option<&E>) -> Option<E> + Send + Sync,
{
    let existing = E::load(ctx.store.as_ref(), key).await?;
    if plan(existing.as_ref()).is_none() {
        return Ok((ItemOutcome::Unchanged, existing));
    }

    guard.ensure_live()?;
    let _permit = ctx.governor.acquire_write().await?;
    let mut tx = ctx.store.begin().await?;

    let existing = E::load_in(tx.as_mut(), key).await?;
    let Some(desired) = plan(existing.as_ref()) else {
        tx.rollback().await?;
        return Ok((ItemOutcome::Unchanged, existing));
    };

    guard.ensure_live()?;
    let outcome = if existing.is_some() {
        desired.update(tx.as_mut()).await?;
        on_update
    } else {
        desired.insert(tx.as_mut()).await?;
        ItemOutcome::Inserted
    };
    tx.commit().await?;

    trace!(kind = E::KIND, key, ?outcome, "Wrote item");
    Ok((outcome, Some(desired)))
}

/// Fold finished item tasks into `report`, isolating per-item failures.
pub(crate) async fn collect_items(
    report: &mut SectionReport,
    tasks: JoinSet<Result<SectionReport>>,
) {
    let section = report.section;
    let mut crashed = 0;
    let results = join_all_isolated(tasks, |err| {
        error!(%section, error = %err, "Sync task did not finish");
        crashed += 1;
    })
    .await;
    report.failed += crashed;

    for result in results {
        match result {
            Ok(item) => report.absorb(&item),
            Err(e) if e.is_stale() => {
                debug!(%section, "Item skipped: generation is stale");
                report.stale = true;
            }
            Err(e) => {
                warn!(%section, error = %e, "Item sync failed");
                report.failed += 1;
            }
        }
    }
}

/// Run one full pass of `section`.
#[instrument(skip_all, fields(section = %S::SECTION, generation = guard.generation()))]
pub(crate) async fn reconcile_section<S: EntitySection>(
    section: Arc<S>,
    ctx: Arc<SyncContext>,
    guard: GenerationGuard,
) -> SectionReport {
    let mut report = SectionReport::new(S::SECTION);

    let remote = match section.fetch(ctx.catalog.as_ref()).await {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "Remote fetch failed; section skipped");
            report.fetch_error = Some(e.to_string());
            return report;
        }
    };
    if !guard.is_live() {
        debug!("Generation went stale during fetch");
        report.stale = true;
        return report;
    }

    let mut seen = HashSet::new();
    let remote: Vec<S::Remote> = remote
        .into_iter()
        .filter(|item| seen.insert(S::remote_key(item).to_string()))
        .collect();

    let linked = match section.linked(ctx.store.as_ref()).await {
        Ok(linked) => linked,
        Err(e) => {
            warn!(error = %e, "Failed to read local section");
            report.failed += 1;
            return report;
        }
    };

    let mut unlinks = JoinSet::new();
    for local in linked
        .into_iter()
        .filter(|local| !seen.contains(local.key()))
    {
        let ctx = Arc::clone(&ctx);
        let guard = guard.clone();
        unlinks.spawn(async move {
            let (outcome, _) = write_item(
                &ctx,
                &guard,
                local.key(),
                ItemOutcome::Unlinked,
                |existing: Option<&S::Local>| existing.and_then(S::unlink),
            )
            .await?;
            let mut item = SectionReport::new(S::SECTION);
            item.record(outcome);
            Ok(item)
        });
    }
    collect_items(&mut report, unlinks).await;

    if !guard.is_live() {
        debug!("Generation went stale after unlinking");
        report.stale = true;
        return report;
    }

    let linked_at = ctx.now_millis();
    let mut upserts = JoinSet::new();
    for (rank, remote_item) in remote.into_iter().enumerate() {
        let section = Arc::clone(&section);
        let ctx = Arc::clone(&ctx);
        let guard = guard.clone();
        upserts.spawn(async move {
            let key = S::remote_key(&remote_item).to_string();
            let (outcome, local) = write_item(
                &ctx,
                &guard,
                &key,
                ItemOutcome::Updated,
                |existing: Option<&S::Local>| {
                    section.merge(existing, &remote_item, rank as i64, linked_at)
                },
            )
            .await?;

            let mut item = SectionReport::new(S::SECTION);
            item.record(outcome);
            if let Some(local) = local {
                if let Some(nested) = section.after_upsert(&ctx, &guard, &local).await {
                    item.absorb(&nested);
                }
            }
            Ok(item)
        });
    }
    collect_items(&mut report, upserts).await;

    debug!(
        inserted = report.inserted,
        updated = report.updated,
        unlinked = report.unlinked,
        failed = report.failed,
        stale = report.stale,
        "Section reconciled"
    );
    report
}
