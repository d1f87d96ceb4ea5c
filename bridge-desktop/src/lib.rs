//! # Desktop Bridge Implementations
//!
//! Default implementations of the storage bridge traits for desktop
//! platforms (macOS, Windows, Linux).
//!
//! - [`SqliteSettingsStore`] - `SettingsStore` backed by a small SQLite file
//! - [`KeyringSecureStore`] - `SecureStore` backed by the OS keychain
//! - [`MemorySecureStore`] - `SecureStore` for headless machines and tests
//!
//! The remote catalog has no desktop default; hosts bring their own client.
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{KeyringSecureStore, SqliteSettingsStore};
//!
//! let settings = SqliteSettingsStore::new(data_dir.join("settings.db")).await?;
//! let secure = KeyringSecureStore::new();
//! ```

mod memory;
mod settings;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use memory::MemorySecureStore;
pub use settings::SqliteSettingsStore;

#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
