//! # Host Bridge Traits
//!
//! Contracts between the library sync engine and the host application.
//!
//! ## Overview
//!
//! The engine never talks to the network, the keychain or the preference
//! store directly. Each of those capabilities is a trait defined here and
//! implemented by the host (or by `bridge-desktop` for desktop builds).
//!
//! ## Traits
//!
//! - [`RemoteCatalog`](catalog::RemoteCatalog) - Read access to the user's
//!   library on the music service, plus the "like" write path
//! - [`SecureStore`](storage::SecureStore) - Session credential persistence
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it with an actionable message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`; the engine shares them across
//! tasks behind `Arc`.

pub mod catalog;
pub mod error;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use catalog::{
    RemoteAlbum, RemoteAlbumRef, RemoteArtist, RemoteArtistRef, RemoteCatalog, RemotePlaylist,
    RemotePlaylistSong, RemoteSong,
};
pub use storage::{SecureStore, SettingsStore};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
