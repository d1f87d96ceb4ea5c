//! Local library entities.
//!
//! Each entity mirrors a remote catalog item. Timestamps are Unix
//! milliseconds. A `None` liked/bookmarked timestamp means the item is not
//! in the corresponding remote collection; the row itself is kept.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A song seen in any library section or playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SongEntity {
    /// Catalog id (video id)
    pub id: String,
    pub title: String,
    /// Credited artists, comma separated
    pub artist_names: Option<String>,
    pub album_id: Option<String>,
    pub album_title: Option<String>,
    pub duration_secs: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub explicit: bool,
    /// When the song was first seen liked; `None` when not liked
    pub liked_at: Option<i64>,
    /// Index in the remote liked order, 0 = most recent
    pub liked_rank: Option<i64>,
    /// When the song was first seen in the library; `None` when not in it
    pub in_library_at: Option<i64>,
    pub created_at: i64,
}

impl SongEntity {
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist_names: None,
            album_id: None,
            album_title: None,
            duration_secs: None,
            thumbnail_url: None,
            explicit: false,
            liked_at: None,
            liked_rank: None,
            in_library_at: None,
            created_at,
        }
    }

    pub fn is_liked(&self) -> bool {
        self.liked_at.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Song id cannot be empty".to_string());
        }
        if self.liked_at.is_some() != self.liked_rank.is_some() {
            return Err("liked_at and liked_rank must be set together".to_string());
        }
        if matches!(self.liked_rank, Some(rank) if rank < 0) {
            return Err("liked_rank cannot be negative".to_string());
        }
        Ok(())
    }
}

/// An album saved to the library at some point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AlbumEntity {
    /// Browse id of the album page
    pub id: String,
    pub playlist_id: Option<String>,
    pub title: String,
    pub artist_names: Option<String>,
    pub year: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub explicit: bool,
    pub bookmarked_at: Option<i64>,
    /// Index in the remote saved order, 0 = most recent
    pub bookmark_rank: Option<i64>,
    pub created_at: i64,
}

impl AlbumEntity {
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            playlist_id: None,
            title: title.into(),
            artist_names: None,
            year: None,
            thumbnail_url: None,
            explicit: false,
            bookmarked_at: None,
            bookmark_rank: None,
            created_at,
        }
    }

    pub fn is_bookmarked(&self) -> bool {
        self.bookmarked_at.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Album id cannot be empty".to_string());
        }
        if self.bookmarked_at.is_some() != self.bookmark_rank.is_some() {
            return Err("bookmarked_at and bookmark_rank must be set together".to_string());
        }
        Ok(())
    }
}

/// An artist the user subscribed to at some point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ArtistEntity {
    pub id: String,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub channel_id: Option<String>,
    pub bookmarked_at: Option<i64>,
    pub bookmark_rank: Option<i64>,
    pub created_at: i64,
}

impl ArtistEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            thumbnail_url: None,
            channel_id: None,
            bookmarked_at: None,
            bookmark_rank: None,
            created_at,
        }
    }

    pub fn is_bookmarked(&self) -> bool {
        self.bookmarked_at.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Artist id cannot be empty".to_string());
        }
        if self.bookmarked_at.is_some() != self.bookmark_rank.is_some() {
            return Err("bookmarked_at and bookmark_rank must be set together".to_string());
        }
        Ok(())
    }
}

/// A playlist, either mirrored from the remote library (`browse_id` set) or
/// created locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlaylistEntity {
    /// Local id (UUID)
    pub id: String,
    pub name: String,
    /// Remote browse id; `None` for local-only playlists
    pub browse_id: Option<String>,
    pub author: Option<String>,
    pub song_count: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub is_editable: bool,
    /// Contents are refreshed on every sync even when not saved remotely
    pub is_auto_sync: bool,
    pub bookmarked_at: Option<i64>,
    pub created_at: i64,
}

impl PlaylistEntity {
    /// New playlist with a fresh local id.
    pub fn new(name: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            browse_id: None,
            author: None,
            song_count: None,
            thumbnail_url: None,
            is_editable: false,
            is_auto_sync: false,
            bookmarked_at: None,
            created_at,
        }
    }

    pub fn is_bookmarked(&self) -> bool {
        self.bookmarked_at.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Playlist name cannot be empty".to_string());
        }
        if matches!(&self.browse_id, Some(browse_id) if browse_id.trim().is_empty()) {
            return Err("Playlist browse id cannot be blank".to_string());
        }
        Ok(())
    }
}

/// One ordered entry of a playlist.
///
/// `position` is the only ordering authority and is contiguous from 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlaylistSongMap {
    pub playlist_id: String,
    pub song_id: String,
    pub position: i64,
    /// Remote mutation key of this entry
    pub set_video_id: Option<String>,
}
