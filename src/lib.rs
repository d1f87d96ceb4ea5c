//! Workspace umbrella crate.
//!
//! Re-exports the library sync service so host applications can depend on a
//! single crate and pick bridge implementations through feature flags
//! (`desktop-shims` for the SQLite settings store, `keychain` for the OS
//! credential store).

#[cfg(any(feature = "desktop-shims", feature = "keychain"))]
pub use core_service::*;
