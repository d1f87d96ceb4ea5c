//! Library store contract.
//!
//! Reads go straight through [`LibraryStore`]; every write goes through a
//! [`LibraryTransaction`] obtained from [`LibraryStore::begin`]. A
//! transaction dropped without [`commit`](LibraryTransaction::commit) is
//! rolled back.
//!
//! Callers must not read through the store while holding an open
//! transaction on the same task: a single-connection pool would wait on
//! itself.
//!
//! ```rust,ignore
//! let mut tx = store.begin().await?;
//! if let Some(mut song) = tx.song("v1").await? {
//!     song.liked_at = None;
//!     song.liked_rank = None;
//!     tx.update_song(&song).await?;
//! }
//! tx.commit().await?;
//! ```

use crate::error::Result;
use crate::models::{AlbumEntity, ArtistEntity, PlaylistEntity, PlaylistSongMap, SongEntity};
use async_trait::async_trait;

/// Ordered reads over the local library plus the transaction entry point.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Liked songs by `liked_rank` ascending (remote order)
    async fn liked_songs(&self) -> Result<Vec<SongEntity>>;

    /// Library songs, most recently added first
    async fn library_songs(&self) -> Result<Vec<SongEntity>>;

    /// Bookmarked albums by `bookmark_rank` ascending
    async fn bookmarked_albums(&self) -> Result<Vec<AlbumEntity>>;

    /// Bookmarked artists by `bookmark_rank` ascending
    async fn bookmarked_artists(&self) -> Result<Vec<ArtistEntity>>;

    /// All playlists by name
    async fn playlists(&self) -> Result<Vec<PlaylistEntity>>;

    /// Playlists flagged for auto-sync that have a remote browse id
    async fn auto_sync_playlists(&self) -> Result<Vec<PlaylistEntity>>;

    /// Ordered entries of a playlist by position
    async fn playlist_songs(&self, playlist_id: &str) -> Result<Vec<PlaylistSongMap>>;

    async fn song(&self, id: &str) -> Result<Option<SongEntity>>;

    async fn album(&self, id: &str) -> Result<Option<AlbumEntity>>;

    async fn artist(&self, id: &str) -> Result<Option<ArtistEntity>>;

    async fn playlist(&self, id: &str) -> Result<Option<PlaylistEntity>>;

    async fn playlist_by_browse_id(&self, browse_id: &str) -> Result<Option<PlaylistEntity>>;

    /// Open a write transaction
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>>;
}

/// A single atomic unit of library writes.
#[async_trait]
pub trait LibraryTransaction: Send {
    async fn song(&mut self, id: &str) -> Result<Option<SongEntity>>;

    async fn insert_song(&mut self, song: &SongEntity) -> Result<()>;

    /// Replace every mirrored column of an existing song
    async fn update_song(&mut self, song: &SongEntity) -> Result<()>;

    async fn album(&mut self, id: &str) -> Result<Option<AlbumEntity>>;

    async fn insert_album(&mut self, album: &AlbumEntity) -> Result<()>;

    async fn update_album(&mut self, album: &AlbumEntity) -> Result<()>;

    async fn artist(&mut self, id: &str) -> Result<Option<ArtistEntity>>;

    async fn insert_artist(&mut self, artist: &ArtistEntity) -> Result<()>;

    async fn update_artist(&mut self, artist: &ArtistEntity) -> Result<()>;

    async fn playlist_by_browse_id(&mut self, browse_id: &str) -> Result<Option<PlaylistEntity>>;

    async fn insert_playlist(&mut self, playlist: &PlaylistEntity) -> Result<()>;

    async fn update_playlist(&mut self, playlist: &PlaylistEntity) -> Result<()>;

    /// Remove every entry of a playlist; returns how many were removed
    async fn clear_playlist(&mut self, playlist_id: &str) -> Result<u64>;

    async fn insert_playlist_song(&mut self, entry: &PlaylistSongMap) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
