use crate::generation::GenerationToken;
use crate::governor::WriteGovernor;
use bridge_traits::{Clock, RemoteCatalog};
use core_library::LibraryStore;
use core_runtime::events::EventBus;
use std::sync::Arc;

/// Collaborators shared by every sync task of one coordinator.
pub(crate) struct SyncContext {
    pub catalog: Arc<dyn RemoteCatalog>,
    pub store: Arc<dyn LibraryStore>,
    pub governor: WriteGovernor,
    pub generation: Arc<GenerationToken>,
    pub clock: Arc<dyn Clock>,
    pub events: EventBus,
}

impl SyncContext {
    pub fn now_millis(&self) -> i64 {
        self.clock.unix_timestamp_millis()
    }
}
