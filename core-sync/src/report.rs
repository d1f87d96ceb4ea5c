//! Per-section and per-run sync reports.

use core_runtime::events::SyncCounts;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reconciled slice of the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    LikedSongs,
    LibrarySongs,
    LikedAlbums,
    ArtistSubscriptions,
    SavedPlaylists,
    AutoSyncPlaylists,
    PlaylistContent,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::LikedSongs => "liked_songs",
            Section::LibrarySongs => "library_songs",
            Section::LikedAlbums => "liked_albums",
            Section::ArtistSubscriptions => "artist_subscriptions",
            Section::SavedPlaylists => "saved_playlists",
            Section::AutoSyncPlaylists => "auto_sync_playlists",
            Section::PlaylistContent => "playlist_content",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Inserted,
    Updated,
    Unlinked,
    Unchanged,
}

/// Outcome of one section pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionReport {
    pub section: Section,
    pub inserted: u64,
    pub updated: u64,
    pub unlinked: u64,
    /// Items whose write failed
    pub failed: u64,
    /// The pass stopped because its generation went stale
    pub stale: bool,
    /// The remote fetch failed and nothing was reconciled
    pub fetch_error: Option<String>,
}

impl SectionReport {
    pub fn new(section: Section) -> Self {
        Self {
            section,
            inserted: 0,
            updated: 0,
            unlinked: 0,
            failed: 0,
            stale: false,
            fetch_error: None,
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Inserted => self.inserted += 1,
            ItemOutcome::Updated => self.updated += 1,
            ItemOutcome::Unlinked => self.unlinked += 1,
            ItemOutcome::Unchanged => {}
        }
    }

    /// Fold a nested report (e.g. playlist contents) into this one.
    pub fn absorb(&mut self, other: &SectionReport) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.unlinked += other.unlinked;
        self.failed += other.failed;
        self.stale |= other.stale;
    }

    pub fn writes(&self) -> u64 {
        self.inserted + self.updated + self.unlinked
    }

    pub fn counts(&self) -> SyncCounts {
        SyncCounts {
            inserted: self.inserted,
            updated: self.updated,
            unlinked: self.unlinked,
            failed: self.failed,
        }
    }
}

/// Outcome of one full sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: String,
    pub generation: u64,
    pub sections: Vec<SectionReport>,
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn section(&self, section: Section) -> Option<&SectionReport> {
        self.sections.iter().find(|report| report.section == section)
    }

    pub fn totals(&self) -> SyncCounts {
        self.sections
            .iter()
            .fold(SyncCounts::default(), |mut totals, report| {
                totals.inserted += report.inserted;
                totals.updated += report.updated;
                totals.unlinked += report.unlinked;
                totals.failed += report.failed;
                totals
            })
    }

    pub fn is_stale(&self) -> bool {
        self.sections.iter().any(|report| report.stale)
    }
}
