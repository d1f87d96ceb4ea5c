//! # Sync Coordinator
//!
//! Mirrors the user's remote library into the local store.
//!
//! ## Overview
//!
//! The `SyncCoordinator` owns the single-flight flag and the generation
//! token, and drives the section syncers:
//! - Liked songs, library songs, liked albums and artist subscriptions run
//!   concurrently
//! - Saved playlists (and their contents) run once those have finished
//! - Auto-sync playlists have their contents refreshed last
//!
//! ## Workflow
//!
//! ### Full Sync
//! 1. Claim the single-flight flag; a second caller returns immediately
//! 2. Check login state and the sync preference
//! 3. Capture the current generation
//! 4. Fan out the four entity sections and wait for all of them
//! 5. Saved playlists, then auto-sync playlists
//! 6. Release the flag (also on panic or early return)
//!
//! ### Cancellation
//! Signing out or disabling sync bumps the generation. Passes already
//! running keep fetching but stop writing at their next check.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncConfig, SyncCoordinator};
//!
//! let coordinator = SyncCoordinator::new(
//!     SyncConfig::default(),
//!     catalog,
//!     store,
//!     session,
//!     settings,
//!     clock,
//!     event_bus,
//! );
//!
//! if let Some(report) = coordinator.perform_full_sync().await {
//!     println!("{} rows written", report.totals().writes());
//! }
//! ```

use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::generation::{GenerationGuard, GenerationToken};
use crate::governor::WriteGovernor;
use crate::playlist_content::{sync_playlist_content, ContentOutcome};
use crate::playlists::{sync_auto_playlists, SavedPlaylists};
use crate::preferences::SyncPreferences;
use crate::reconcile::{reconcile_section, EntitySection};
use crate::report::{SectionReport, SyncReport};
use crate::sections::{ArtistSubscriptions, LibrarySongs, LikedAlbums, LikedSongs};
use bridge_traits::{Clock, RemoteCatalog, SettingsStore};
use core_async::task::{self, join_all_isolated, JoinSet};
use core_async::time::Instant;
use core_auth::LoginState;
use core_library::LibraryStore;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Sync coordinator configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum concurrent store write transactions
    pub max_concurrent_writes: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrent_writes: 2,
        }
    }
}

/// Clears the single-flight flag when dropped.
struct RunningFlag<'a>(&'a AtomicBool);

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sync coordinator for the library mirror
pub struct SyncCoordinator {
    ctx: Arc<SyncContext>,
    login: Arc<dyn LoginState>,
    preferences: SyncPreferences,
    running: AtomicBool,
    /// Set by `on_signed_out` until `on_signed_in`. Guards enabling the
    /// generation token; never held across an await.
    signed_out: Mutex<bool>,
}

impl SyncCoordinator {
    /// Create a new sync coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - Write concurrency
    /// * `catalog` - Remote catalog client supplied by the host
    /// * `store` - Local library store
    /// * `login` - Login gate, normally the `SessionManager`
    /// * `settings` - Where the sync preferences live
    /// * `clock` - Time source for liked/bookmarked timestamps
    /// * `event_bus` - Progress events
    pub fn new(
        config: SyncConfig,
        catalog: Arc<dyn RemoteCatalog>,
        store: Arc<dyn LibraryStore>,
        login: Arc<dyn LoginState>,
        settings: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Self {
        let ctx = SyncContext {
            catalog,
            store,
            governor: WriteGovernor::new(config.max_concurrent_writes),
            generation: Arc::new(GenerationToken::default()),
            clock,
            events: event_bus,
        };

        Self {
            ctx: Arc::new(ctx),
            login,
            preferences: SyncPreferences::new(settings),
            running: AtomicBool::new(false),
            signed_out: Mutex::new(false),
        }
    }

    pub fn generation(&self) -> &Arc<GenerationToken> {
        &self.ctx.generation
    }

    pub fn preferences(&self) -> &SyncPreferences {
        &self.preferences
    }

    /// Whether a full sync currently holds the single-flight flag
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Reconcile the whole library.
    ///
    /// Returns `None` when the run was skipped (already running, not logged
    /// in, sync disabled). Failures inside sections are logged and counted
    /// in the report; they never escape.
    #[instrument(skip(self))]
    pub async fn perform_full_sync(&self) -> Option<SyncReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Full sync already running");
            self.emit_skipped("already running");
            return None;
        }
        let _running = RunningFlag(&self.running);

        let guard = match self.open_pass().await {
            Ok(guard) => guard,
            Err(e) => {
                info!(reason = %e, "Full sync skipped");
                self.emit_skipped(&e.to_string());
                return None;
            }
        };

        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        info!(%run_id, generation = guard.generation(), "Full sync started");
        self.ctx
            .events
            .emit(CoreEvent::Sync(SyncEvent::Started {
                run_id: run_id.clone(),
                generation: guard.generation(),
            }))
            .ok();

        let mut entity_tasks = JoinSet::new();
        entity_tasks.spawn(reconcile_section(
            Arc::new(LikedSongs),
            Arc::clone(&self.ctx),
            guard.clone(),
        ));
        entity_tasks.spawn(reconcile_section(
            Arc::new(LibrarySongs),
            Arc::clone(&self.ctx),
            guard.clone(),
        ));
        entity_tasks.spawn(reconcile_section(
            Arc::new(LikedAlbums),
            Arc::clone(&self.ctx),
            guard.clone(),
        ));
        entity_tasks.spawn(reconcile_section(
            Arc::new(ArtistSubscriptions),
            Arc::clone(&self.ctx),
            guard.clone(),
        ));
        let mut sections = join_all_isolated(entity_tasks, |err| {
            error!(%run_id, error = %err, "Section task did not finish");
        })
        .await;

        let selected = self
            .preferences
            .selected_playlist_ids()
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Unreadable playlist selection; mirroring all playlists");
                BTreeSet::new()
            });
        let saved_playlists = Arc::new(SavedPlaylists::new(selected));
        let saved = task::spawn(reconcile_section(
            Arc::clone(&saved_playlists),
            Arc::clone(&self.ctx),
            guard.clone(),
        ));
        match saved.await {
            Ok(report) => sections.push(report),
            Err(err) => error!(%run_id, error = %err, "Saved playlists task did not finish"),
        }

        let content_synced = saved_playlists.content_synced().await;
        let auto = task::spawn(sync_auto_playlists(
            Arc::clone(&self.ctx),
            guard.clone(),
            content_synced,
        ));
        match auto.await {
            Ok(report) => sections.push(report),
            Err(err) => error!(%run_id, error = %err, "Auto-sync playlists task did not finish"),
        }

        sections.sort_by_key(|report| report.section);
        for report in &sections {
            self.emit_section(Some(&run_id), report);
        }

        let report = SyncReport {
            run_id,
            generation: guard.generation(),
            sections,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        let totals = report.totals();
        info!(
            run_id = %report.run_id,
            writes = totals.writes(),
            failed = totals.failed,
            stale = report.is_stale(),
            duration_ms = report.duration_ms,
            "Full sync finished"
        );
        self.ctx
            .events
            .emit(CoreEvent::Sync(SyncEvent::Completed {
                run_id: report.run_id.clone(),
                counts: totals,
                duration_ms: report.duration_ms,
            }))
            .ok();

        Some(report)
    }

    #[instrument(skip(self))]
    pub async fn sync_liked_songs(&self) -> Result<SectionReport> {
        self.run_section(LikedSongs).await
    }

    #[instrument(skip(self))]
    pub async fn sync_library_songs(&self) -> Result<SectionReport> {
        self.run_section(LibrarySongs).await
    }

    #[instrument(skip(self))]
    pub async fn sync_liked_albums(&self) -> Result<SectionReport> {
        self.run_section(LikedAlbums).await
    }

    #[instrument(skip(self))]
    pub async fn sync_artist_subscriptions(&self) -> Result<SectionReport> {
        self.run_section(ArtistSubscriptions).await
    }

    #[instrument(skip(self))]
    pub async fn sync_saved_playlists(&self) -> Result<SectionReport> {
        let selected = self.preferences.selected_playlist_ids().await?;
        self.run_section(SavedPlaylists::new(selected)).await
    }

    #[instrument(skip(self))]
    pub async fn sync_auto_sync_playlists(&self) -> Result<SectionReport> {
        let guard = self.open_pass().await?;
        let report = sync_auto_playlists(Arc::clone(&self.ctx), guard, BTreeSet::new()).await;
        self.emit_section(None, &report);
        Ok(report)
    }

    /// Mirror the contents of one playlist.
    #[instrument(skip(self))]
    pub async fn sync_playlist(&self, browse_id: &str, playlist_id: &str) -> Result<ContentOutcome> {
        let guard = self.open_pass().await?;
        sync_playlist_content(&self.ctx, &guard, browse_id, playlist_id).await
    }

    /// Like or unlike a song on the service. Local rows pick the change up
    /// on the next liked-songs pass.
    #[instrument(skip(self))]
    pub async fn like_song(&self, song_id: &str, liked: bool) -> Result<()> {
        let guard = self.open_pass().await?;
        guard.ensure_live()?;

        self.ctx
            .catalog
            .set_liked(song_id, liked)
            .await
            .map_err(SyncError::Remote)?;
        info!(song_id, liked, "Propagated like to the service");
        Ok(())
    }

    /// Persist the preference and stop or re-arm syncing accordingly.
    #[instrument(skip(self))]
    pub async fn set_sync_enabled(&self, enabled: bool) -> Result<()> {
        self.preferences.set_sync_enabled(enabled).await?;

        let signed_out = self.signed_out.lock().unwrap_or_else(|e| e.into_inner());
        let token = &self.ctx.generation;
        if !enabled {
            token.disable();
            info!(generation = token.current_generation(), "Library sync disabled");
        } else if !*signed_out && !token.is_enabled() {
            token.enable();
            info!(generation = token.current_generation(), "Library sync enabled");
        }
        Ok(())
    }

    /// Stop every running pass from writing. Called when the session ends.
    pub fn on_signed_out(&self) {
        let mut signed_out = self.signed_out.lock().unwrap_or_else(|e| e.into_inner());
        *signed_out = true;
        self.ctx.generation.disable();
        info!(
            generation = self.ctx.generation.current_generation(),
            "Signed out; in-flight syncs will stop writing"
        );
    }

    /// Allow passes again after a new session started.
    pub fn on_signed_in(&self) {
        let mut signed_out = self.signed_out.lock().unwrap_or_else(|e| e.into_inner());
        *signed_out = false;
        debug!("Signed in; sync passes allowed");
    }

    /// Check the gates and capture a generation for a new pass.
    async fn open_pass(&self) -> Result<GenerationGuard> {
        if !self.login.is_logged_in().await {
            return Err(SyncError::NotLoggedIn);
        }
        let enabled = self.preferences.sync_enabled().await?;

        let signed_out = self.signed_out.lock().unwrap_or_else(|e| e.into_inner());
        if *signed_out {
            return Err(SyncError::NotLoggedIn);
        }
        let token = &self.ctx.generation;
        if !enabled {
            if token.is_enabled() {
                token.disable();
            }
            return Err(SyncError::SyncDisabled);
        }
        if !token.is_enabled() {
            token.enable();
        }
        Ok(token.capture())
    }

    async fn run_section<S: EntitySection>(&self, section: S) -> Result<SectionReport> {
        let guard = self.open_pass().await?;
        let report = reconcile_section(Arc::new(section), Arc::clone(&self.ctx), guard).await;
        self.emit_section(None, &report);
        Ok(report)
    }

    fn emit_skipped(&self, reason: &str) {
        self.ctx
            .events
            .emit(CoreEvent::Sync(SyncEvent::Skipped {
                reason: reason.to_string(),
            }))
            .ok();
    }

    fn emit_section(&self, run_id: Option<&str>, report: &SectionReport) {
        self.ctx
            .events
            .emit(CoreEvent::Sync(SyncEvent::SectionCompleted {
                run_id: run_id.map(str::to_string),
                section: report.section.as_str().to_string(),
                counts: report.counts(),
                stale: report.stale,
            }))
            .ok();
    }
}
