//! Membership sections mirrored through the reconcile engine.
//!
//! Ranked sections store the remote index as an explicit rank (0 = first in
//! remote order). The liked/bookmarked timestamp is the pass timestamp for
//! newly linked rows and is preserved for rows that were already linked.

use crate::reconcile::{changed, EntitySection};
use crate::report::Section;
use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{RemoteAlbum, RemoteArtist, RemoteArtistRef, RemoteCatalog, RemoteSong};
use core_library::{AlbumEntity, ArtistEntity, LibraryStore, SongEntity};

type LibraryResult<T> = core_library::Result<T>;

/// Copy catalog metadata onto a song row.
///
/// Optional fields are only filled, never cleared, because different
/// sections return the same song with different levels of detail.
pub(crate) fn mirror_song(song: &mut SongEntity, remote: &RemoteSong) {
    song.title = remote.title.clone();
    if let Some(artists) = remote.artist_names() {
        song.artist_names = Some(artists);
    }
    if let Some(album) = &remote.album {
        song.album_id = Some(album.id.clone());
        song.album_title = Some(album.title.clone());
    }
    if remote.duration_secs.is_some() {
        song.duration_secs = remote.duration_secs;
    }
    if remote.thumbnail_url.is_some() {
        song.thumbnail_url = remote.thumbnail_url.clone();
    }
    song.explicit |= remote.explicit;
}

/// A song row for a song first seen in `remote`.
pub(crate) fn new_song(remote: &RemoteSong, created_at: i64) -> SongEntity {
    let mut song = SongEntity::new(&remote.id, &remote.title, created_at);
    mirror_song(&mut song, remote);
    song
}

fn joined_names(artists: &[RemoteArtistRef]) -> Option<String> {
    if artists.is_empty() {
        return None;
    }
    Some(
        artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

// ----------------------------------------------------------------------------
// Liked songs
// ----------------------------------------------------------------------------

pub(crate) struct LikedSongs;

#[async_trait]
impl EntitySection for LikedSongs {
    type Remote = RemoteSong;
    type Local = SongEntity;

    const SECTION: Section = Section::LikedSongs;

    async fn fetch(&self, catalog: &dyn RemoteCatalog) -> BridgeResult<Vec<RemoteSong>> {
        catalog.fetch_liked_songs().await
    }

    fn remote_key(remote: &RemoteSong) -> &str {
        &remote.id
    }

    async fn linked(&self, store: &dyn LibraryStore) -> LibraryResult<Vec<SongEntity>> {
        store.liked_songs().await
    }

    fn unlink(local: &SongEntity) -> Option<SongEntity> {
        local.is_liked().then(|| SongEntity {
            liked_at: None,
            liked_rank: None,
            ..local.clone()
        })
    }

    fn merge(
        &self,
        existing: Option<&SongEntity>,
        remote: &RemoteSong,
        rank: i64,
        linked_at: i64,
    ) -> Option<SongEntity> {
        let mut song = match existing {
            Some(song) => {
                let mut song = song.clone();
                mirror_song(&mut song, remote);
                song
            }
            None => new_song(remote, linked_at),
        };
        song.liked_at = Some(song.liked_at.unwrap_or(linked_at));
        song.liked_rank = Some(rank);
        changed(existing, song)
    }
}

// ----------------------------------------------------------------------------
// Library songs
// ----------------------------------------------------------------------------

/// Songs added to the library. Unranked; ordered by `in_library_at`.
pub(crate) struct LibrarySongs;

#[async_trait]
impl EntitySection for LibrarySongs {
    type Remote = RemoteSong;
    type Local = SongEntity;

    const SECTION: Section = Section::LibrarySongs;

    async fn fetch(&self, catalog: &dyn RemoteCatalog) -> BridgeResult<Vec<RemoteSong>> {
        catalog.fetch_library_songs().await
    }

    fn remote_key(remote: &RemoteSong) -> &str {
        &remote.id
    }

    async fn linked(&self, store: &dyn LibraryStore) -> LibraryResult<Vec<SongEntity>> {
        store.library_songs().await
    }

    fn unlink(local: &SongEntity) -> Option<SongEntity> {
        local.in_library_at.is_some().then(|| SongEntity {
            in_library_at: None,
            ..local.clone()
        })
    }

    fn merge(
        &self,
        existing: Option<&SongEntity>,
        remote: &RemoteSong,
        _rank: i64,
        linked_at: i64,
    ) -> Option<SongEntity> {
        let mut song = match existing {
            Some(song) => {
                let mut song = song.clone();
                mirror_song(&mut song, remote);
                song
            }
            None => new_song(remote, linked_at),
        };
        song.in_library_at = Some(song.in_library_at.unwrap_or(linked_at));
        changed(existing, song)
    }
}

// ----------------------------------------------------------------------------
// Liked albums
// ----------------------------------------------------------------------------

pub(crate) struct LikedAlbums;

#[async_trait]
impl EntitySection for LikedAlbums {
    type Remote = RemoteAlbum;
    type Local = AlbumEntity;

    const SECTION: Section = Section::LikedAlbums;

    async fn fetch(&self, catalog: &dyn RemoteCatalog) -> BridgeResult<Vec<RemoteAlbum>> {
        catalog.fetch_liked_albums().await
    }

    fn remote_key(remote: &RemoteAlbum) -> &str {
        &remote.id
    }

    async fn linked(&self, store: &dyn LibraryStore) -> LibraryResult<Vec<AlbumEntity>> {
        store.bookmarked_albums().await
    }

    fn unlink(local: &AlbumEntity) -> Option<AlbumEntity> {
        local.is_bookmarked().then(|| AlbumEntity {
            bookmarked_at: None,
            bookmark_rank: None,
            ..local.clone()
        })
    }

    fn merge(
        &self,
        existing: Option<&AlbumEntity>,
        remote: &RemoteAlbum,
        rank: i64,
        linked_at: i64,
    ) -> Option<AlbumEntity> {
        let mut album = existing
            .cloned()
            .unwrap_or_else(|| AlbumEntity::new(&remote.id, &remote.title, linked_at));
        album.title = remote.title.clone();
        album.playlist_id = remote.playlist_id.clone();
        album.artist_names = joined_names(&remote.artists);
        album.year = remote.year.map(i64::from);
        album.thumbnail_url = remote.thumbnail_url.clone();
        album.explicit = remote.explicit;
        album.bookmarked_at = Some(album.bookmarked_at.unwrap_or(linked_at));
        album.bookmark_rank = Some(rank);
        changed(existing, album)
    }
}

// ----------------------------------------------------------------------------
// Artist subscriptions
// ----------------------------------------------------------------------------

pub(crate) struct ArtistSubscriptions;

#[async_trait]
impl EntitySection for ArtistSubscriptions {
    type Remote = RemoteArtist;
    type Local = ArtistEntity;

    const SECTION: Section = Section::ArtistSubscriptions;

    async fn fetch(&self, catalog: &dyn RemoteCatalog) -> BridgeResult<Vec<RemoteArtist>> {
        catalog.fetch_artist_subscriptions().await
    }

    fn remote_key(remote: &RemoteArtist) -> &str {
        &remote.id
    }

    async fn linked(&self, store: &dyn LibraryStore) -> LibraryResult<Vec<ArtistEntity>> {
        store.bookmarked_artists().await
    }

    fn unlink(local: &ArtistEntity) -> Option<ArtistEntity> {
        local.is_bookmarked().then(|| ArtistEntity {
            bookmarked_at: None,
            bookmark_rank: None,
            ..local.clone()
        })
    }

    fn merge(
        &self,
        existing: Option<&ArtistEntity>,
        remote: &RemoteArtist,
        rank: i64,
        linked_at: i64,
    ) -> Option<ArtistEntity> {
        let mut artist = existing
            .cloned()
            .unwrap_or_else(|| ArtistEntity::new(&remote.id, &remote.name, linked_at));
        artist.name = remote.name.clone();
        artist.thumbnail_url = remote.thumbnail_url.clone();
        artist.channel_id = remote.channel_id.clone();
        artist.bookmarked_at = Some(artist.bookmarked_at.unwrap_or(linked_at));
        artist.bookmark_rank = Some(rank);
        changed(existing, artist)
    }
}
