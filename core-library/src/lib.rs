//! # Library Store Module
//!
//! Owns the local mirror of the user's music-service library.
//!
//! ## Overview
//!
//! - SQLite schema and migrations ([`db`])
//! - Entity types for songs, albums, artists, playlists and ordered
//!   playlist entries ([`models`])
//! - The [`LibraryStore`] / [`LibraryTransaction`] contract the sync engine
//!   writes through ([`store`]), with a SQLite implementation in
//!   [`adapters::sqlite_native`]

pub mod adapters;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use adapters::SqliteLibraryStore;
pub use error::{LibraryError, Result};
pub use models::{AlbumEntity, ArtistEntity, PlaylistEntity, PlaylistSongMap, SongEntity};
pub use store::{LibraryStore, LibraryTransaction};
