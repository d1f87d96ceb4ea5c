//! # Generation Token
//!
//! Cooperative cancellation for sync passes. A pass captures the current
//! generation when it starts and checks it before every local write; once
//! the token is disabled or the generation moves on, the pass stops writing
//! and returns.
//!
//! Remote fetches already in flight are never aborted. Their results are
//! simply discarded at the next check.
//!
//! ```rust,ignore
//! let guard = token.capture();
//! let songs = catalog.fetch_liked_songs().await?;
//! guard.ensure_live()?; // stop here if the user signed out meanwhile
//! ```

use crate::error::{Result, SyncError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Enabled flag plus a monotonically increasing generation counter.
#[derive(Debug)]
pub struct GenerationToken {
    enabled: AtomicBool,
    generation: AtomicU64,
}

impl GenerationToken {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            generation: AtomicU64::new(0),
        }
    }

    /// Stop every pass captured so far.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Re-enable writes. The generation moves too, so a pass captured while
    /// disabled never becomes live again.
    pub fn enable(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_live(&self, generation: u64) -> bool {
        self.is_enabled() && self.current_generation() == generation
    }

    /// Capture the current generation for a new pass.
    pub fn capture(self: &Arc<Self>) -> GenerationGuard {
        GenerationGuard {
            token: Arc::clone(self),
            generation: self.current_generation(),
        }
    }
}

impl Default for GenerationToken {
    fn default() -> Self {
        Self::new(true)
    }
}

/// A captured generation, passed down the call chain of one pass.
#[derive(Debug, Clone)]
pub struct GenerationGuard {
    token: Arc<GenerationToken>,
    generation: u64,
}

impl GenerationGuard {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_live(&self) -> bool {
        self.token.is_live(self.generation)
    }

    /// `Err(StaleGeneration)` once the pass must stop writing.
    pub fn ensure_live(&self) -> Result<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(SyncError::StaleGeneration {
                generation: self.generation,
            })
        }
    }
}
