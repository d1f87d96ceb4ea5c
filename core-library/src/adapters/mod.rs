//! Store implementations

pub mod sqlite_native;

pub use sqlite_native::SqliteLibraryStore;
