//! Remote Catalog Abstraction
//!
//! The music service's catalog is the authoritative source of the user's
//! library. Hosts implement [`RemoteCatalog`] on top of whatever client talks
//! to the service; the sync engine only ever sees the immutable snapshot
//! types defined here.
//!
//! Implementations own transport concerns: authentication headers,
//! pagination (every `fetch_*` returns the *complete* collection), retries and
//! timeouts. A failed fetch is reported as a [`BridgeError`](crate::BridgeError)
//! and never as a partial collection.
//!
//! # Example
//!
//! ```ignore
//! use bridge_traits::catalog::{RemoteCatalog, RemoteSong};
//!
//! async fn count_liked(catalog: &dyn RemoteCatalog) -> usize {
//!     catalog.fetch_liked_songs().await.map(|songs| songs.len()).unwrap_or(0)
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Browse id of the service's automatic "liked music" playlist.
pub const LIKED_MUSIC_PLAYLIST_ID: &str = "LM";

/// Browse id of the service's "saved episodes" playlist.
pub const SAVED_EPISODES_PLAYLIST_ID: &str = "SE";

/// Reference to an artist credited on a song or album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteArtistRef {
    /// Catalog id, absent for credits the service does not link
    pub id: Option<String>,
    pub name: String,
}

/// Reference to the album a song belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAlbumRef {
    pub id: String,
    pub title: String,
}

/// A song as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSong {
    /// Stable catalog id (video id)
    pub id: String,
    pub title: String,
    pub artists: Vec<RemoteArtistRef>,
    pub album: Option<RemoteAlbumRef>,
    pub duration_secs: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub explicit: bool,
}

impl RemoteSong {
    /// Convenience constructor used by hosts and tests.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artists: Vec::new(),
            album: None,
            duration_secs: None,
            thumbnail_url: None,
            explicit: false,
        }
    }

    /// Credited artist names joined the way the service displays them.
    pub fn artist_names(&self) -> Option<String> {
        if self.artists.is_empty() {
            return None;
        }
        Some(
            self.artists
                .iter()
                .map(|artist| artist.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// One entry of a playlist's ordered contents.
///
/// `set_video_id` is the remote mutation key for this particular occurrence
/// of the song in this particular playlist; it is required to reorder or
/// remove the entry remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlaylistSong {
    pub song: RemoteSong,
    pub set_video_id: Option<String>,
}

/// An album as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAlbum {
    /// Browse id of the album page
    pub id: String,
    /// Id of the playlist backing the album, used for playback
    pub playlist_id: Option<String>,
    pub title: String,
    pub artists: Vec<RemoteArtistRef>,
    pub year: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub explicit: bool,
}

impl RemoteAlbum {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            playlist_id: None,
            title: title.into(),
            artists: Vec::new(),
            year: None,
            thumbnail_url: None,
            explicit: false,
        }
    }
}

/// An artist (channel) as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteArtist {
    pub id: String,
    pub name: String,
    pub thumbnail_url: Option<String>,
    /// Channel used for subscribe/unsubscribe calls
    pub channel_id: Option<String>,
}

impl RemoteArtist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            thumbnail_url: None,
            channel_id: None,
        }
    }
}

/// A saved playlist header as returned by the catalog.
///
/// The ordered contents are fetched separately through
/// [`RemoteCatalog::fetch_playlist_contents`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlaylist {
    /// Browse id of the playlist
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub song_count: Option<i64>,
    pub thumbnail_url: Option<String>,
    /// Whether the signed-in user may edit the playlist remotely
    pub is_editable: bool,
}

impl RemotePlaylist {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: None,
            song_count: None,
            thumbnail_url: None,
            is_editable: false,
        }
    }

    /// System playlists mirror other library sections and are never saved.
    pub fn is_system(&self) -> bool {
        self.id == LIKED_MUSIC_PLAYLIST_ID || self.id == SAVED_EPISODES_PLAYLIST_ID
    }
}

/// Read access to the user's library on the music service, plus the one
/// write path the engine needs.
///
/// Collections are returned in the service's display order: most recently
/// liked/added first.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Songs in the user's liked-music playlist, most recent first
    async fn fetch_liked_songs(&self) -> Result<Vec<RemoteSong>>;

    /// Songs the user added to their library
    async fn fetch_library_songs(&self) -> Result<Vec<RemoteSong>>;

    /// Albums saved to the library, most recent first
    async fn fetch_liked_albums(&self) -> Result<Vec<RemoteAlbum>>;

    /// Artists the user subscribes to, most recent first
    async fn fetch_artist_subscriptions(&self) -> Result<Vec<RemoteArtist>>;

    /// Playlists saved to the library (including system playlists)
    async fn fetch_saved_playlists(&self) -> Result<Vec<RemotePlaylist>>;

    /// Ordered contents of a single playlist
    async fn fetch_playlist_contents(&self, browse_id: &str) -> Result<Vec<RemotePlaylistSong>>;

    /// Like or unlike a song on the service
    async fn set_liked(&self, song_id: &str, liked: bool) -> Result<()>;
}
