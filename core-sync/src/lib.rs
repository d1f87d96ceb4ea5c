//! # Library Sync Module
//!
//! Mirrors the user's remote music-service library into the local store.
//!
//! ## Overview
//!
//! The remote catalog is authoritative. Each sync pass fetches a complete
//! remote collection, unlinks local rows the remote no longer lists, and
//! inserts or updates the rest. Rows are never deleted; leaving a collection
//! only clears the liked/bookmarked timestamp.
//!
//! ## Components
//!
//! - **Sync Coordinator** (`coordinator`): single-flight full sync, per-section
//!   entry points, the like path and sign-out handling
//! - **Generation Token** (`generation`): cooperative cancellation checked
//!   before every write
//! - **Write Governor** (`governor`): bounded write transactions and per-playlist
//!   locks
//! - **Reconcile Engine** (`reconcile`, `sections`, `playlists`): the shared
//!   diff-and-reconcile algorithm and its sections
//! - **Playlist Content Syncer** (`playlist_content`): ordered playlist contents
//! - **Preferences** (`preferences`): sync toggle and playlist selection

mod context;
pub mod coordinator;
pub mod error;
pub mod generation;
pub mod governor;
pub mod playlist_content;
mod playlists;
pub mod preferences;
mod reconcile;
pub mod report;
mod sections;

pub use coordinator::{SyncConfig, SyncCoordinator};
pub use error::{Result, SyncError};
pub use generation::{GenerationGuard, GenerationToken};
pub use governor::WriteGovernor;
pub use playlist_content::ContentOutcome;
pub use preferences::SyncPreferences;
pub use report::{ItemOutcome, Section, SectionReport, SyncReport};
