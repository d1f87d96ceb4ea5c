//! Shared fixtures for the sync integration tests.
//!
//! `ScriptedCatalog` is a hand-written fake whose collections tests can
//! change between runs; `CountingStore` wraps the SQLite store, counts
//! opened transactions and can inject write failures.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::SqliteSettingsStore;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    ManualClock, RemoteAlbum, RemoteArtist, RemoteCatalog, RemotePlaylist, RemotePlaylistSong,
    RemoteSong,
};
use core_async::sync::Notify;
use core_auth::MockLoginState;
use core_library::db::{create_pool, create_test_pool, DatabaseConfig};
use core_library::{
    AlbumEntity, ArtistEntity, LibraryStore, LibraryTransaction, PlaylistEntity, PlaylistSongMap,
    LibraryError, SongEntity, SqliteLibraryStore,
};
use core_runtime::events::EventBus;
use core_sync::{GenerationToken, SyncConfig, SyncCoordinator};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const NOW: i64 = 1_700_000_000_000;

pub fn song(id: &str) -> RemoteSong {
    RemoteSong::new(id, format!("Song {}", id))
}

pub fn entry(id: &str) -> RemotePlaylistSong {
    RemotePlaylistSong {
        song: song(id),
        set_video_id: Some(format!("set-{}", id)),
    }
}

/// Blocks one fetch until released.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
struct CatalogState {
    liked: Vec<RemoteSong>,
    library: Vec<RemoteSong>,
    albums: Vec<RemoteAlbum>,
    artists: Vec<RemoteArtist>,
    playlists: Vec<RemotePlaylist>,
    contents: HashMap<String, Vec<RemotePlaylistSong>>,
    liked_fails: bool,
    liked_gate: Option<Arc<Gate>>,
}

#[derive(Default)]
pub struct ScriptedCatalog {
    state: Mutex<CatalogState>,
    content_fetches: AtomicUsize,
}

impl ScriptedCatalog {
    fn state(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap()
    }

    pub fn set_liked(&self, ids: &[&str]) {
        self.state().liked = ids.iter().map(|id| song(id)).collect();
    }

    pub fn set_library(&self, ids: &[&str]) {
        self.state().library = ids.iter().map(|id| song(id)).collect();
    }

    pub fn set_albums(&self, albums: Vec<RemoteAlbum>) {
        self.state().albums = albums;
    }

    pub fn set_artists(&self, artists: Vec<RemoteArtist>) {
        self.state().artists = artists;
    }

    pub fn set_playlists(&self, playlists: Vec<RemotePlaylist>) {
        self.state().playlists = playlists;
    }

    pub fn set_contents(&self, browse_id: &str, ids: &[&str]) {
        self.set_entries(browse_id, ids.iter().map(|id| entry(id)).collect());
    }

    pub fn set_entries(&self, browse_id: &str, entries: Vec<RemotePlaylistSong>) {
        self.state().contents.insert(browse_id.to_string(), entries);
    }

    pub fn fail_liked(&self, fails: bool) {
        self.state().liked_fails = fails;
    }

    /// The next liked-songs fetch waits on the returned gate.
    pub fn block_next_liked_fetch(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.state().liked_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn content_fetches(&self) -> usize {
        self.content_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCatalog for ScriptedCatalog {
    async fn fetch_liked_songs(&self) -> BridgeResult<Vec<RemoteSong>> {
        let gate = self.state().liked_gate.take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let state = self.state();
        if state.liked_fails {
            return Err(BridgeError::Remote("HTTP 503".to_string()));
        }
        Ok(state.liked.clone())
    }

    async fn fetch_library_songs(&self) -> BridgeResult<Vec<RemoteSong>> {
        Ok(self.state().library.clone())
    }

    async fn fetch_liked_albums(&self) -> BridgeResult<Vec<RemoteAlbum>> {
        Ok(self.state().albums.clone())
    }

    async fn fetch_artist_subscriptions(&self) -> BridgeResult<Vec<RemoteArtist>> {
        Ok(self.state().artists.clone())
    }

    async fn fetch_saved_playlists(&self) -> BridgeResult<Vec<RemotePlaylist>> {
        Ok(self.state().playlists.clone())
    }

    async fn fetch_playlist_contents(&self, browse_id: &str) -> BridgeResult<Vec<RemotePlaylistSong>> {
        self.content_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state()
            .contents
            .get(browse_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_liked(&self, _song_id: &str, _liked: bool) -> BridgeResult<()> {
        Ok(())
    }
}

/// SQLite store that counts opened transactions.
pub struct CountingStore {
    inner: SqliteLibraryStore,
    begins: AtomicUsize,
    failing_songs: Mutex<BTreeSet<String>>,
    disable_on_begin: Mutex<Option<Arc<GenerationToken>>>,
}

impl CountingStore {
    fn new(inner: SqliteLibraryStore) -> Self {
        Self {
            inner,
            begins: AtomicUsize::new(0),
            failing_songs: Mutex::new(BTreeSet::new()),
            disable_on_begin: Mutex::new(None),
        }
    }

    pub fn transactions(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    /// Every insert or update of song `id` fails.
    pub fn fail_song_writes(&self, id: &str) {
        self.failing_songs.lock().unwrap().insert(id.to_string());
    }

    /// The next `begin` disables `token` once the transaction is open.
    pub fn disable_on_next_begin(&self, token: Arc<GenerationToken>) {
        *self.disable_on_begin.lock().unwrap() = Some(token);
    }
}

#[async_trait]
impl LibraryStore for CountingStore {
    async fn liked_songs(&self) -> core_library::Result<Vec<SongEntity>> {
        self.inner.liked_songs().await
    }

    async fn library_songs(&self) -> core_library::Result<Vec<SongEntity>> {
        self.inner.library_songs().await
    }

    async fn bookmarked_albums(&self) -> core_library::Result<Vec<AlbumEntity>> {
        self.inner.bookmarked_albums().await
    }

    async fn bookmarked_artists(&self) -> core_library::Result<Vec<ArtistEntity>> {
        self.inner.bookmarked_artists().await
    }

    async fn playlists(&self) -> core_library::Result<Vec<PlaylistEntity>> {
        self.inner.playlists().await
    }

    async fn auto_sync_playlists(&self) -> core_library::Result<Vec<PlaylistEntity>> {
        self.inner.auto_sync_playlists().await
    }

    async fn playlist_songs(&self, playlist_id: &str) -> core_library::Result<Vec<PlaylistSongMap>> {
        self.inner.playlist_songs(playlist_id).await
    }

    async fn song(&self, id: &str) -> core_library::Result<Option<SongEntity>> {
        self.inner.song(id).await
    }

    async fn album(&self, id: &str) -> core_library::Result<Option<AlbumEntity>> {
        self.inner.album(id).await
    }

    async fn artist(&self, id: &str) -> core_library::Result<Option<ArtistEntity>> {
        self.inner.artist(id).await
    }

    async fn playlist(&self, id: &str) -> core_library::Result<Option<PlaylistEntity>> {
        self.inner.playlist(id).await
    }

    async fn playlist_by_browse_id(
        &self,
        browse_id: &str,
    ) -> core_library::Result<Option<PlaylistEntity>> {
        self.inner.playlist_by_browse_id(browse_id).await
    }

    async fn begin(&self) -> core_library::Result<Box<dyn LibraryTransaction>> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.begin().await?;
        if let Some(token) = self.disable_on_begin.lock().unwrap().take() {
            token.disable();
        }
        Ok(Box::new(FlakyTransaction {
            inner,
            failing_songs: self.failing_songs.lock().unwrap().clone(),
        }))
    }
}

/// Delegates to the SQLite transaction, failing writes of selected songs.
struct FlakyTransaction {
    inner: Box<dyn LibraryTransaction>,
    failing_songs: BTreeSet<String>,
}

impl FlakyTransaction {
    fn check(&self, song: &SongEntity) -> core_library::Result<()> {
        if self.failing_songs.contains(&song.id) {
            return Err(LibraryError::InvalidInput {
                field: "id".to_string(),
                message: format!("write of {} rejected", song.id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LibraryTransaction for FlakyTransaction {
    async fn song(&mut self, id: &str) -> core_library::Result<Option<SongEntity>> {
        self.inner.song(id).await
    }

    async fn insert_song(&mut self, song: &SongEntity) -> core_library::Result<()> {
        self.check(song)?;
        self.inner.insert_song(song).await
    }

    async fn update_song(&mut self, song: &SongEntity) -> core_library::Result<()> {
        self.check(song)?;
        self.inner.update_song(song).await
    }

    async fn album(&mut self, id: &str) -> core_library::Result<Option<AlbumEntity>> {
        self.inner.album(id).await
    }

    async fn insert_album(&mut self, album: &AlbumEntity) -> core_library::Result<()> {
        self.inner.insert_album(album).await
    }

    async fn update_album(&mut self, album: &AlbumEntity) -> core_library::Result<()> {
        self.inner.update_album(album).await
    }

    async fn artist(&mut self, id: &str) -> core_library::Result<Option<ArtistEntity>> {
        self.inner.artist(id).await
    }

    async fn insert_artist(&mut self, artist: &ArtistEntity) -> core_library::Result<()> {
        self.inner.insert_artist(artist).await
    }

    async fn update_artist(&mut self, artist: &ArtistEntity) -> core_library::Result<()> {
        self.inner.update_artist(artist).await
    }

    async fn playlist_by_browse_id(
        &mut self,
        browse_id: &str,
    ) -> core_library::Result<Option<PlaylistEntity>> {
        self.inner.playlist_by_browse_id(browse_id).await
    }

    async fn insert_playlist(&mut self, playlist: &PlaylistEntity) -> core_library::Result<()> {
        self.inner.insert_playlist(playlist).await
    }

    async fn update_playlist(&mut self, playlist: &PlaylistEntity) -> core_library::Result<()> {
        self.inner.update_playlist(playlist).await
    }

    async fn clear_playlist(&mut self, playlist_id: &str) -> core_library::Result<u64> {
        self.inner.clear_playlist(playlist_id).await
    }

    async fn insert_playlist_song(&mut self, entry: &PlaylistSongMap) -> core_library::Result<()> {
        self.inner.insert_playlist_song(entry).await
    }

    async fn commit(self: Box<Self>) -> core_library::Result<()> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> core_library::Result<()> {
        self.inner.rollback().await
    }
}

pub struct Harness {
    pub coordinator: Arc<SyncCoordinator>,
    pub catalog: Arc<ScriptedCatalog>,
    pub store: Arc<CountingStore>,
    pub events: EventBus,
}

pub async fn harness() -> Harness {
    let pool = create_test_pool().await.unwrap();
    harness_on(SqliteLibraryStore::new(pool)).await
}

/// Harness on a WAL database file with the production pool settings.
pub async fn file_harness(db: &TempDatabase) -> Harness {
    let pool = create_pool(DatabaseConfig::new(db.path.clone()))
        .await
        .unwrap();
    harness_on(SqliteLibraryStore::new(pool)).await
}

async fn harness_on(inner: SqliteLibraryStore) -> Harness {
    let catalog = Arc::new(ScriptedCatalog::default());
    let store = Arc::new(CountingStore::new(inner));
    let mut login = MockLoginState::new();
    login.expect_is_logged_in().returning(|| true);
    let settings = SqliteSettingsStore::in_memory().await.unwrap();
    let events = EventBus::new(256);

    let coordinator = SyncCoordinator::new(
        SyncConfig::default(),
        catalog.clone(),
        store.clone(),
        Arc::new(login),
        Arc::new(settings),
        Arc::new(ManualClock::at_millis(NOW)),
        events.clone(),
    );

    Harness {
        coordinator: Arc::new(coordinator),
        catalog,
        store,
        events,
    }
}

/// Database file under the temp dir, removed with its WAL files on drop.
pub struct TempDatabase {
    pub path: PathBuf,
}

impl TempDatabase {
    pub fn new() -> Self {
        let name = format!("library-sync-test-{}.db", uuid::Uuid::new_v4());
        Self {
            path: std::env::temp_dir().join(name),
        }
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub fn ids(songs: &[SongEntity]) -> Vec<&str> {
    songs.iter().map(|song| song.id.as_str()).collect()
}
