//! Native SQLite Library Store
//!
//! Implements [`LibraryStore`] over a `sqlx` SQLite pool. Queries are
//! written once against a generic `Executor` and shared by the pool-backed
//! reads and the transaction-backed reads and writes.

use crate::error::{LibraryError, Result};
use crate::models::{AlbumEntity, ArtistEntity, PlaylistEntity, PlaylistSongMap, SongEntity};
use crate::store::{LibraryStore, LibraryTransaction};
use async_trait::async_trait;
use sqlx::{query, query_as, Executor, Sqlite, SqlitePool, Transaction};
use tracing::debug;

/// SQLite implementation of [`LibraryStore`]
#[derive(Clone)]
pub struct SqliteLibraryStore {
    pool: SqlitePool,
}

impl SqliteLibraryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn invalid(field: &str) -> impl FnOnce(String) -> LibraryError + '_ {
    move |message| LibraryError::InvalidInput {
        field: field.to_string(),
        message,
    }
}

fn not_found(entity_type: &str, id: &str) -> LibraryError {
    LibraryError::NotFound {
        entity_type: entity_type.to_string(),
        id: id.to_string(),
    }
}

// ----------------------------------------------------------------------------
// Songs
// ----------------------------------------------------------------------------

async fn fetch_song<'e, E>(executor: E, id: &str) -> Result<Option<SongEntity>>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(query_as::<_, SongEntity>("SELECT * FROM songs WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

async fn insert_song<'e, E>(executor: E, song: &SongEntity) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    song.validate().map_err(invalid("song"))?;

    query(
        r#"
        INSERT INTO songs (
            id, title, artist_names, album_id, album_title, duration_secs,
            thumbnail_url, explicit, liked_at, liked_rank, in_library_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&song.id)
    .bind(&song.title)
    .bind(&song.artist_names)
    .bind(&song.album_id)
    .bind(&song.album_title)
    .bind(song.duration_secs)
    .bind(&song.thumbnail_url)
    .bind(song.explicit)
    .bind(song.liked_at)
    .bind(song.liked_rank)
    .bind(song.in_library_at)
    .bind(song.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn update_song<'e, E>(executor: E, song: &SongEntity) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    song.validate().map_err(invalid("song"))?;

    let result = query(
        r#"
        UPDATE songs SET
            title = ?, artist_names = ?, album_id = ?, album_title = ?,
            duration_secs = ?, thumbnail_url = ?, explicit = ?,
            liked_at = ?, liked_rank = ?, in_library_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&song.title)
    .bind(&song.artist_names)
    .bind(&song.album_id)
    .bind(&song.album_title)
    .bind(song.duration_secs)
    .bind(&song.thumbnail_url)
    .bind(song.explicit)
    .bind(song.liked_at)
    .bind(song.liked_rank)
    .bind(song.in_library_at)
    .bind(&song.id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("Song", &song.id));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Albums
// ----------------------------------------------------------------------------

async fn fetch_album<'e, E>(executor: E, id: &str) -> Result<Option<AlbumEntity>>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(query_as::<_, AlbumEntity>("SELECT * FROM albums WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

async fn insert_album<'e, E>(executor: E, album: &AlbumEntity) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    album.validate().map_err(invalid("album"))?;

    query(
        r#"
        INSERT INTO albums (
            id, playlist_id, title, artist_names, year, thumbnail_url,
            explicit, bookmarked_at, bookmark_rank, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&album.id)
    .bind(&album.playlist_id)
    .bind(&album.title)
    .bind(&album.artist_names)
    .bind(album.year)
    .bind(&album.thumbnail_url)
    .bind(album.explicit)
    .bind(album.bookmarked_at)
    .bind(album.bookmark_rank)
    .bind(album.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn update_album<'e, E>(executor: E, album: &AlbumEntity) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    album.validate().map_err(invalid("album"))?;

    let result = query(
        r#"
        UPDATE albums SET
            playlist_id = ?, title = ?, artist_names = ?, year = ?,
            thumbnail_url = ?, explicit = ?, bookmarked_at = ?, bookmark_rank = ?
        WHERE id = ?
        "#,
    )
    .bind(&album.playlist_id)
    .bind(&album.title)
    .bind(&album.artist_names)
    .bind(album.year)
    .bind(&album.thumbnail_url)
    .bind(album.explicit)
    .bind(album.bookmarked_at)
    .bind(album.bookmark_rank)
    .bind(&album.id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("Album", &album.id));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Artists
// ----------------------------------------------------------------------------

async fn fetch_artist<'e, E>(executor: E, id: &str) -> Result<Option<ArtistEntity>>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(query_as::<_, ArtistEntity>("SELECT * FROM artists WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

async fn insert_artist<'e, E>(executor: E, artist: &ArtistEntity) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    artist.validate().map_err(invalid("artist"))?;

    query(
        r#"
        INSERT INTO artists (
            id, name, thumbnail_url, channel_id, bookmarked_at, bookmark_rank, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&artist.id)
    .bind(&artist.name)
    .bind(&artist.thumbnail_url)
    .bind(&artist.channel_id)
    .bind(artist.bookmarked_at)
    .bind(artist.bookmark_rank)
    .bind(artist.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn update_artist<'e, E>(executor: E, artist: &ArtistEntity) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    artist.validate().map_err(invalid("artist"))?;

    let result = query(
        r#"
        UPDATE artists SET
            name = ?, thumbnail_url = ?, channel_id = ?, bookmarked_at = ?, bookmark_rank = ?
        WHERE id = ?
        "#,
    )
    .bind(&artist.name)
    .bind(&artist.thumbnail_url)
    .bind(&artist.channel_id)
    .bind(artist.bookmarked_at)
    .bind(artist.bookmark_rank)
    .bind(&artist.id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("Artist", &artist.id));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Playlists
// ----------------------------------------------------------------------------

async fn fetch_playlist_by_browse_id<'e, E>(
    executor: E,
    browse_id: &str,
) -> Result<Option<PlaylistEntity>>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(
        query_as::<_, PlaylistEntity>("SELECT * FROM playlists WHERE browse_id = ?")
            .bind(browse_id)
            .fetch_optional(executor)
            .await?,
    )
}

async fn insert_playlist<'e, E>(executor: E, playlist: &PlaylistEntity) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    playlist.validate().map_err(invalid("playlist"))?;

    query(
        r#"
        INSERT INTO playlists (
            id, name, browse_id, author, song_count, thumbnail_url,
            is_editable, is_auto_sync, bookmarked_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&playlist.id)
    .bind(&playlist.name)
    .bind(&playlist.browse_id)
    .bind(&playlist.author)
    .bind(playlist.song_count)
    .bind(&playlist.thumbnail_url)
    .bind(playlist.is_editable)
    .bind(playlist.is_auto_sync)
    .bind(playlist.bookmarked_at)
    .bind(playlist.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn update_playlist<'e, E>(executor: E, playlist: &PlaylistEntity) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    playlist.validate().map_err(invalid("playlist"))?;

    let result = query(
        r#"
        UPDATE playlists SET
            name = ?, browse_id = ?, author = ?, song_count = ?, thumbnail_url = ?,
            is_editable = ?, is_auto_sync = ?, bookmarked_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&playlist.name)
    .bind(&playlist.browse_id)
    .bind(&playlist.author)
    .bind(playlist.song_count)
    .bind(&playlist.thumbnail_url)
    .bind(playlist.is_editable)
    .bind(playlist.is_auto_sync)
    .bind(playlist.bookmarked_at)
    .bind(&playlist.id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("Playlist", &playlist.id));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Store
// ----------------------------------------------------------------------------

#[async_trait]
impl LibraryStore for SqliteLibraryStore {
    async fn liked_songs(&self) -> Result<Vec<SongEntity>> {
        Ok(query_as::<_, SongEntity>(
            "SELECT * FROM songs WHERE liked_at IS NOT NULL ORDER BY liked_rank ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn library_songs(&self) -> Result<Vec<SongEntity>> {
        Ok(query_as::<_, SongEntity>(
            "SELECT * FROM songs WHERE in_library_at IS NOT NULL \
             ORDER BY in_library_at DESC, title ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn bookmarked_albums(&self) -> Result<Vec<AlbumEntity>> {
        Ok(query_as::<_, AlbumEntity>(
            "SELECT * FROM albums WHERE bookmarked_at IS NOT NULL ORDER BY bookmark_rank ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn bookmarked_artists(&self) -> Result<Vec<ArtistEntity>> {
        Ok(query_as::<_, ArtistEntity>(
            "SELECT * FROM artists WHERE bookmarked_at IS NOT NULL ORDER BY bookmark_rank ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn playlists(&self) -> Result<Vec<PlaylistEntity>> {
        Ok(
            query_as::<_, PlaylistEntity>("SELECT * FROM playlists ORDER BY name ASC, id ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn auto_sync_playlists(&self) -> Result<Vec<PlaylistEntity>> {
        Ok(query_as::<_, PlaylistEntity>(
            "SELECT * FROM playlists WHERE is_auto_sync = 1 AND browse_id IS NOT NULL \
             ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn playlist_songs(&self, playlist_id: &str) -> Result<Vec<PlaylistSongMap>> {
        Ok(query_as::<_, PlaylistSongMap>(
            "SELECT * FROM playlist_song_map WHERE playlist_id = ? ORDER BY position ASC",
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn song(&self, id: &str) -> Result<Option<SongEntity>> {
        fetch_song(&self.pool, id).await
    }

    async fn album(&self, id: &str) -> Result<Option<AlbumEntity>> {
        fetch_album(&self.pool, id).await
    }

    async fn artist(&self, id: &str) -> Result<Option<ArtistEntity>> {
        fetch_artist(&self.pool, id).await
    }

    async fn playlist(&self, id: &str) -> Result<Option<PlaylistEntity>> {
        Ok(
            query_as::<_, PlaylistEntity>("SELECT * FROM playlists WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn playlist_by_browse_id(&self, browse_id: &str) -> Result<Option<PlaylistEntity>> {
        fetch_playlist_by_browse_id(&self.pool, browse_id).await
    }

    /// Takes the write lock up front. Under WAL, upgrading a read
    /// transaction to a write fails with `SQLITE_BUSY` instead of waiting
    /// out the busy timeout.
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>> {
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(Box::new(SqliteLibraryTransaction { tx: Some(tx) }))
    }
}

// ----------------------------------------------------------------------------
// Transaction
// ----------------------------------------------------------------------------

/// Open SQLite transaction; dropping it rolls back.
struct SqliteLibraryTransaction {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteLibraryTransaction {
    fn conn(&mut self) -> Result<&mut Transaction<'static, Sqlite>> {
        self.tx.as_mut().ok_or(LibraryError::TransactionClosed)
    }
}

#[async_trait]
impl LibraryTransaction for SqliteLibraryTransaction {
    async fn song(&mut self, id: &str) -> Result<Option<SongEntity>> {
        fetch_song(&mut **self.conn()?, id).await
    }

    async fn insert_song(&mut self, song: &SongEntity) -> Result<()> {
        insert_song(&mut **self.conn()?, song).await
    }

    async fn update_song(&mut self, song: &SongEntity) -> Result<()> {
        update_song(&mut **self.conn()?, song).await
    }

    async fn album(&mut self, id: &str) -> Result<Option<AlbumEntity>> {
        fetch_album(&mut **self.conn()?, id).await
    }

    async fn insert_album(&mut self, album: &AlbumEntity) -> Result<()> {
        insert_album(&mut **self.conn()?, album).await
    }

    async fn update_album(&mut self, album: &AlbumEntity) -> Result<()> {
        update_album(&mut **self.conn()?, album).await
    }

    async fn artist(&mut self, id: &str) -> Result<Option<ArtistEntity>> {
        fetch_artist(&mut **self.conn()?, id).await
    }

    async fn insert_artist(&mut self, artist: &ArtistEntity) -> Result<()> {
        insert_artist(&mut **self.conn()?, artist).await
    }

    async fn update_artist(&mut self, artist: &ArtistEntity) -> Result<()> {
        update_artist(&mut **self.conn()?, artist).await
    }

    async fn playlist_by_browse_id(&mut self, browse_id: &str) -> Result<Option<PlaylistEntity>> {
        fetch_playlist_by_browse_id(&mut **self.conn()?, browse_id).await
    }

    async fn insert_playlist(&mut self, playlist: &PlaylistEntity) -> Result<()> {
        insert_playlist(&mut **self.conn()?, playlist).await
    }

    async fn update_playlist(&mut self, playlist: &PlaylistEntity) -> Result<()> {
        update_playlist(&mut **self.conn()?, playlist).await
    }

    async fn clear_playlist(&mut self, playlist_id: &str) -> Result<u64> {
        let result = query("DELETE FROM playlist_song_map WHERE playlist_id = ?")
            .bind(playlist_id)
            .execute(&mut **self.conn()?)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_playlist_song(&mut self, entry: &PlaylistSongMap) -> Result<()> {
        if entry.position < 0 {
            return Err(LibraryError::InvalidInput {
                field: "position".to_string(),
                message: "position cannot be negative".to_string(),
            });
        }

        query(
            r#"
            INSERT INTO playlist_song_map (playlist_id, song_id, position, set_video_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&entry.playlist_id)
        .bind(&entry.song_id)
        .bind(entry.position)
        .bind(&entry.set_video_id)
        .execute(&mut **self.conn()?)
        .await?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        let tx = self.tx.take().ok_or(LibraryError::TransactionClosed)?;
        tx.commit().await?;
        debug!("Committed library transaction");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        let tx = self.tx.take().ok_or(LibraryError::TransactionClosed)?;
        tx.rollback().await?;
        debug!("Rolled back library transaction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn store() -> SqliteLibraryStore {
        SqliteLibraryStore::new(create_test_pool().await.unwrap())
    }

    fn liked(id: &str, rank: i64) -> SongEntity {
        let mut song = SongEntity::new(id, format!("Song {}", id), 100);
        song.liked_at = Some(1_000);
        song.liked_rank = Some(rank);
        song
    }

    #[core_async::test]
    async fn test_liked_songs_follow_rank() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        tx.insert_song(&liked("C", 2)).await.unwrap();
        tx.insert_song(&liked("A", 0)).await.unwrap();
        tx.insert_song(&liked("B", 1)).await.unwrap();
        tx.insert_song(&SongEntity::new("X", "Not liked", 100))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let ids: Vec<_> = store
            .liked_songs()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[core_async::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = store().await;
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_song(&liked("A", 0)).await.unwrap();
        }
        assert!(store.song("A").await.unwrap().is_none());

        let mut tx = store.begin().await.unwrap();
        tx.insert_song(&liked("A", 0)).await.unwrap();
        tx.rollback().await.unwrap();
        assert!(store.song("A").await.unwrap().is_none());
    }

    #[core_async::test]
    async fn test_update_missing_row_is_not_found() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        let err = tx.update_song(&liked("ghost", 0)).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
    }

    #[core_async::test]
    async fn test_invalid_entity_rejected() {
        let store = store().await;
        let mut song = SongEntity::new("A", "Song", 0);
        song.liked_at = Some(1);

        let mut tx = store.begin().await.unwrap();
        let err = tx.insert_song(&song).await.unwrap_err();
        assert!(matches!(err, LibraryError::InvalidInput { .. }));
    }

    #[core_async::test]
    async fn test_unlink_keeps_row() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        tx.insert_song(&liked("A", 0)).await.unwrap();
        tx.commit().await.unwrap();

        let mut song = store.song("A").await.unwrap().unwrap();
        song.liked_at = None;
        song.liked_rank = None;
        let mut tx = store.begin().await.unwrap();
        tx.update_song(&song).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.liked_songs().await.unwrap().is_empty());
        assert_eq!(store.song("A").await.unwrap().unwrap().title, "Song A");
    }

    #[core_async::test]
    async fn test_bookmarked_albums_and_artists() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();

        let mut second = AlbumEntity::new("MPRE2", "Second", 0);
        second.bookmarked_at = Some(5);
        second.bookmark_rank = Some(1);
        let mut first = AlbumEntity::new("MPRE1", "First", 0);
        first.bookmarked_at = Some(5);
        first.bookmark_rank = Some(0);
        tx.insert_album(&second).await.unwrap();
        tx.insert_album(&first).await.unwrap();
        tx.insert_album(&AlbumEntity::new("MPRE3", "Unsaved", 0))
            .await
            .unwrap();

        let mut artist = ArtistEntity::new("UC1", "Artist", 0);
        artist.bookmarked_at = Some(5);
        artist.bookmark_rank = Some(0);
        tx.insert_artist(&artist).await.unwrap();
        tx.commit().await.unwrap();

        let albums: Vec<_> = store
            .bookmarked_albums()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(albums, vec!["MPRE1", "MPRE2"]);
        assert_eq!(store.bookmarked_artists().await.unwrap(), vec![artist]);
    }

    #[core_async::test]
    async fn test_playlist_contents_replace() {
        let store = store().await;
        let mut playlist = PlaylistEntity::new("Road trip", 0);
        playlist.browse_id = Some("VLPL1".to_string());
        playlist.is_auto_sync = true;

        let mut tx = store.begin().await.unwrap();
        tx.insert_playlist(&playlist).await.unwrap();
        for id in ["S1", "S2"] {
            tx.insert_song(&SongEntity::new(id, id, 0)).await.unwrap();
        }
        for (position, id) in ["S1", "S2"].iter().enumerate() {
            tx.insert_playlist_song(&PlaylistSongMap {
                playlist_id: playlist.id.clone(),
                song_id: id.to_string(),
                position: position as i64,
                set_video_id: None,
            })
            .await
            .unwrap();
        }
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.clear_playlist(&playlist.id).await.unwrap(), 2);
        tx.insert_playlist_song(&PlaylistSongMap {
            playlist_id: playlist.id.clone(),
            song_id: "S2".to_string(),
            position: 0,
            set_video_id: Some("sv2".to_string()),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let entries = store.playlist_songs(&playlist.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].song_id, "S2");
        assert_eq!(entries[0].set_video_id.as_deref(), Some("sv2"));

        assert_eq!(
            store
                .playlist_by_browse_id("VLPL1")
                .await
                .unwrap()
                .map(|p| p.id),
            Some(playlist.id.clone())
        );
        assert_eq!(store.auto_sync_playlists().await.unwrap().len(), 1);
    }
}
