use bridge_traits::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Library sync is disabled")]
    SyncDisabled,

    /// The captured generation was invalidated; the caller stops quietly.
    #[error("Sync generation {generation} is no longer live")]
    StaleGeneration { generation: u64 },

    #[error("Remote catalog error: {0}")]
    Remote(#[source] BridgeError),

    #[error("Settings error: {0}")]
    Settings(#[source] BridgeError),

    #[error("Library store error: {0}")]
    Library(#[from] LibraryError),

    #[error("Invalid preference value for {key}: {message}")]
    InvalidPreference { key: String, message: String },

    #[error("Sync task failed: {0}")]
    TaskFailed(String),
}

impl SyncError {
    /// Stale aborts are expected and never logged above `debug`.
    pub fn is_stale(&self) -> bool {
        matches!(self, SyncError::StaleGeneration { .. })
    }
}

impl From<BridgeError> for SyncError {
    fn from(err: BridgeError) -> Self {
        SyncError::Remote(err)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
